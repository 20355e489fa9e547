//! Signaling events and their JSON frame encoding
//!
//! Every frame is a single JSON object holding an event tag and a body:
//!
//! ```json
//! {"event": "call", "data": "room-1"}
//! {"event": "candidate", "data": {"roomId": "room-1", "payload": {"sdpMid": "0"}}}
//! ```

use crate::error::ProtocolError;
use crate::ids::{ClientId, RoomId};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::fmt;
use std::str::FromStr;

/// The event-type tags carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Join,
    Call,
    Accept,
    Offer,
    Answer,
    Candidate,
    Disconnected,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Connected,
        EventKind::Join,
        EventKind::Call,
        EventKind::Accept,
        EventKind::Offer,
        EventKind::Answer,
        EventKind::Candidate,
        EventKind::Disconnected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Connected => "connected",
            EventKind::Join => "join",
            EventKind::Call => "call",
            EventKind::Accept => "accept",
            EventKind::Offer => "offer",
            EventKind::Answer => "answer",
            EventKind::Candidate => "candidate",
            EventKind::Disconnected => "disconnected",
        }
    }
}

impl FromStr for EventKind {
    type Err = ProtocolError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| ProtocolError::UnknownEvent(tag.to_string()))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static NO_PAYLOAD: Value = Value::Null;

/// Room id plus an opaque SDP or ICE blob.
///
/// The body object is kept as received and re-emitted unchanged, including the
/// key the payload arrived under (`payload`, or the event name for browser
/// clients sending `{roomId, offer}`) and any other fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Negotiation {
    room_id: RoomId,
    payload_key: String,
    body: Map<String, Value>,
}

impl Negotiation {
    pub fn new(room_id: impl Into<RoomId>, payload: Value) -> Self {
        let room_id = room_id.into();
        let mut body = Map::new();
        body.insert("roomId".to_string(), Value::String(room_id.0.clone()));
        body.insert("payload".to_string(), payload);
        Self {
            room_id,
            payload_key: "payload".to_string(),
            body,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn payload(&self) -> &Value {
        self.body.get(&self.payload_key).unwrap_or(&NO_PAYLOAD)
    }

    /// Body key holding the payload
    pub fn payload_key(&self) -> &str {
        &self.payload_key
    }

    fn to_body(&self) -> Value {
        Value::Object(self.body.clone())
    }
}

/// A typed signaling event sent by a client
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingMessage {
    Join(RoomId),
    Call(RoomId),
    Accept(RoomId),
    Offer(Negotiation),
    Answer(Negotiation),
    Candidate(Negotiation),
    /// Client-initiated hang-up, distinct from the socket closing
    Disconnected(RoomId),
}

impl SignalingMessage {
    pub fn kind(&self) -> EventKind {
        match self {
            SignalingMessage::Join(_) => EventKind::Join,
            SignalingMessage::Call(_) => EventKind::Call,
            SignalingMessage::Accept(_) => EventKind::Accept,
            SignalingMessage::Offer(_) => EventKind::Offer,
            SignalingMessage::Answer(_) => EventKind::Answer,
            SignalingMessage::Candidate(_) => EventKind::Candidate,
            SignalingMessage::Disconnected(_) => EventKind::Disconnected,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        match self {
            SignalingMessage::Join(room)
            | SignalingMessage::Call(room)
            | SignalingMessage::Accept(room)
            | SignalingMessage::Disconnected(room) => room,
            SignalingMessage::Offer(n)
            | SignalingMessage::Answer(n)
            | SignalingMessage::Candidate(n) => n.room_id(),
        }
    }

    /// The negotiation payload, for offer/answer/candidate
    pub fn payload(&self) -> Option<&Value> {
        match self {
            SignalingMessage::Offer(n)
            | SignalingMessage::Answer(n)
            | SignalingMessage::Candidate(n) => Some(n.payload()),
            _ => None,
        }
    }

    fn from_body(kind: EventKind, data: Value) -> Result<Self, ProtocolError> {
        let message = match kind {
            EventKind::Connected => return Err(ProtocolError::OutboundOnly(kind.as_str())),
            EventKind::Join => SignalingMessage::Join(room_from_body(&data)?),
            EventKind::Call => SignalingMessage::Call(room_from_body(&data)?),
            EventKind::Accept => SignalingMessage::Accept(room_from_body(&data)?),
            EventKind::Disconnected => SignalingMessage::Disconnected(room_from_body(&data)?),
            EventKind::Offer => SignalingMessage::Offer(negotiation_from_body(kind, data)?),
            EventKind::Answer => SignalingMessage::Answer(negotiation_from_body(kind, data)?),
            EventKind::Candidate => {
                SignalingMessage::Candidate(negotiation_from_body(kind, data)?)
            }
        };
        Ok(message)
    }

    fn body(&self) -> Value {
        match self {
            SignalingMessage::Join(room)
            | SignalingMessage::Call(room)
            | SignalingMessage::Accept(room)
            | SignalingMessage::Disconnected(room) => Value::String(room.0.clone()),
            SignalingMessage::Offer(n)
            | SignalingMessage::Answer(n)
            | SignalingMessage::Candidate(n) => n.to_body(),
        }
    }
}

/// Decodes one inbound frame
impl FromStr for SignalingMessage {
    type Err = ProtocolError;

    fn from_str(frame: &str) -> Result<Self, Self::Err> {
        let raw: RawFrame = serde_json::from_str(frame)?;
        let kind = raw.event.parse::<EventKind>()?;
        SignalingMessage::from_body(kind, raw.data)
    }
}

/// Encodes the message as one frame
impl fmt::Display for SignalingMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_frame(f, self.kind(), self.body())
    }
}

/// Events sent by the server
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// First frame on every connection, carrying the assigned client id
    Connected(ClientId),
    /// A signaling event relayed to a room member
    Relay(SignalingMessage),
}

impl ServerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ServerEvent::Connected(_) => EventKind::Connected,
            ServerEvent::Relay(message) => message.kind(),
        }
    }
}

impl FromStr for ServerEvent {
    type Err = ProtocolError;

    fn from_str(frame: &str) -> Result<Self, Self::Err> {
        let raw: RawFrame = serde_json::from_str(frame)?;
        match raw.event.parse::<EventKind>()? {
            EventKind::Connected => {
                let id = raw.data.as_str().ok_or(ProtocolError::MissingClientId)?;
                Ok(ServerEvent::Connected(ClientId::from(id)))
            }
            kind => SignalingMessage::from_body(kind, raw.data).map(ServerEvent::Relay),
        }
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerEvent::Connected(id) => {
                write_frame(f, EventKind::Connected, Value::String(id.0.clone()))
            }
            ServerEvent::Relay(message) => fmt::Display::fmt(message, f),
        }
    }
}

#[derive(Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    data: Value,
}

fn write_frame(f: &mut fmt::Formatter<'_>, kind: EventKind, data: Value) -> fmt::Result {
    let frame = json!({ "event": kind.as_str(), "data": data });
    write!(f, "{frame}")
}

/// Bare room id string, or an object with a `roomId` field
fn room_from_body(data: &Value) -> Result<RoomId, ProtocolError> {
    let room = match data {
        Value::String(room) => room.as_str(),
        Value::Object(fields) => fields
            .get("roomId")
            .and_then(Value::as_str)
            .unwrap_or_default(),
        _ => "",
    };
    if room.is_empty() {
        return Err(ProtocolError::MissingRoomId);
    }
    Ok(RoomId::from(room))
}

/// `{roomId, payload}`; browser clients name the payload after the event
/// instead (`{roomId, offer}`), so that key is accepted too.
fn negotiation_from_body(kind: EventKind, data: Value) -> Result<Negotiation, ProtocolError> {
    let room_id = room_from_body(&data)?;
    let Value::Object(body) = data else {
        return Err(ProtocolError::MissingPayload);
    };
    let payload_key = ["payload", kind.as_str()]
        .into_iter()
        .find(|key| body.get(*key).is_some_and(|v| !v.is_null()))
        .ok_or(ProtocolError::MissingPayload)?;
    Ok(Negotiation {
        room_id,
        payload_key: payload_key.to_string(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_unique_and_parse_back() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert!(matches!(
            "hangup".parse::<EventKind>(),
            Err(ProtocolError::UnknownEvent(tag)) if tag == "hangup"
        ));
    }

    #[test]
    fn test_decode_bare_room_events() {
        let cases = [
            ("join", EventKind::Join),
            ("call", EventKind::Call),
            ("accept", EventKind::Accept),
            ("disconnected", EventKind::Disconnected),
        ];
        for (tag, kind) in cases {
            let frame = format!(r#"{{"event":"{tag}","data":"001"}}"#);
            let message: SignalingMessage = frame.parse().unwrap();
            assert_eq!(message.kind(), kind);
            assert_eq!(message.room_id().as_str(), "001");
            assert!(message.payload().is_none());
        }
    }

    #[test]
    fn test_decode_room_object_body() {
        let message: SignalingMessage = r#"{"event":"call","data":{"roomId":"001"}}"#
            .parse()
            .unwrap();
        assert_eq!(message, SignalingMessage::Call(RoomId::from("001")));
    }

    #[test]
    fn test_decode_negotiation_with_payload_key() {
        let message: SignalingMessage =
            r#"{"event":"candidate","data":{"roomId":"x","payload":{"sdpMid":"0"}}}"#
                .parse()
                .unwrap();
        assert_eq!(
            message,
            SignalingMessage::Candidate(Negotiation::new("x", json!({"sdpMid": "0"})))
        );
    }

    #[test]
    fn test_decode_negotiation_with_browser_field_names() {
        let message: SignalingMessage =
            r#"{"event":"offer","data":{"roomId":"001","offer":{"type":"offer","sdp":"v=0"}}}"#
                .parse()
                .unwrap();
        assert_eq!(message.kind(), EventKind::Offer);
        assert_eq!(message.payload().unwrap()["sdp"], "v=0");

        let message: SignalingMessage =
            r#"{"event":"answer","data":{"roomId":"001","answer":{"type":"answer"}}}"#
                .parse()
                .unwrap();
        assert_eq!(message.payload().unwrap()["type"], "answer");
    }

    #[test]
    fn test_reject_malformed_frames() {
        assert!(matches!(
            "not json".parse::<SignalingMessage>(),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            r#"{"data":"001"}"#.parse::<SignalingMessage>(),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            r#"{"event":"join"}"#.parse::<SignalingMessage>(),
            Err(ProtocolError::MissingRoomId)
        ));
        assert!(matches!(
            r#"{"event":"join","data":""}"#.parse::<SignalingMessage>(),
            Err(ProtocolError::MissingRoomId)
        ));
        assert!(matches!(
            r#"{"event":"call","data":42}"#.parse::<SignalingMessage>(),
            Err(ProtocolError::MissingRoomId)
        ));
        assert!(matches!(
            r#"{"event":"offer","data":"001"}"#.parse::<SignalingMessage>(),
            Err(ProtocolError::MissingPayload)
        ));
        assert!(matches!(
            r#"{"event":"answer","data":{"roomId":"001","payload":null}}"#
                .parse::<SignalingMessage>(),
            Err(ProtocolError::MissingPayload)
        ));
        assert!(matches!(
            r#"{"event":"connected","data":"abc"}"#.parse::<SignalingMessage>(),
            Err(ProtocolError::OutboundOnly("connected"))
        ));
    }

    #[test]
    fn test_encode_uses_payload_key() {
        let message = SignalingMessage::Offer(Negotiation::new("001", json!({"sdp": "v=0"})));
        let frame: Value = serde_json::from_str(&message.to_string()).unwrap();
        assert_eq!(
            frame,
            json!({"event": "offer", "data": {"roomId": "001", "payload": {"sdp": "v=0"}}})
        );

        let frame: Value =
            serde_json::from_str(&SignalingMessage::Accept(RoomId::from("001")).to_string())
                .unwrap();
        assert_eq!(frame, json!({"event": "accept", "data": "001"}));
    }

    #[test]
    fn test_server_event_frames() {
        let connected = ServerEvent::Connected(ClientId::from("c1"));
        assert_eq!(connected.kind(), EventKind::Connected);
        assert_eq!(connected.to_string().parse::<ServerEvent>().unwrap(), connected);

        let relay = ServerEvent::Relay(SignalingMessage::Disconnected(RoomId::from("001")));
        assert_eq!(relay.to_string().parse::<ServerEvent>().unwrap(), relay);

        assert!(matches!(
            r#"{"event":"connected","data":7}"#.parse::<ServerEvent>(),
            Err(ProtocolError::MissingClientId)
        ));
    }

    #[test]
    fn test_browser_keyed_body_is_relayed_unchanged() {
        let data = json!({
            "roomId": "001",
            "offer": {"type": "offer", "sdp": "v=0"},
            "extra": 1
        });
        let frame = json!({"event": "offer", "data": data}).to_string();
        let message: SignalingMessage = frame.parse().unwrap();

        let SignalingMessage::Offer(negotiation) = &message else {
            panic!("Expected offer");
        };
        assert_eq!(negotiation.payload_key(), "offer");
        assert_eq!(negotiation.payload()["sdp"], "v=0");

        let relayed: Value = serde_json::from_str(&message.to_string()).unwrap();
        assert_eq!(relayed, json!({"event": "offer", "data": data}));
    }

    #[test]
    fn test_payload_key_wins_over_event_key() {
        let message: SignalingMessage = r#"{"event":"answer","data":{"roomId":"001","payload":{"a":1},"answer":{"b":2}}}"#
            .parse()
            .unwrap();
        assert_eq!(message.payload(), Some(&json!({"a": 1})));

        let relayed: Value = serde_json::from_str(&message.to_string()).unwrap();
        assert_eq!(relayed["data"]["payload"], json!({"a": 1}));
        assert_eq!(relayed["data"]["answer"], json!({"b": 2}));
    }
}

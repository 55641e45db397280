//! Shared value types for the Waypoint voice agent.
//!
//! This crate defines the closed vocabulary the rest of the workspace is
//! configured with: participant transport kinds, noise-cancellation
//! variants, turn-detection strategies, and the capability backend
//! descriptors that fill a session's five slots. Everything here is a plain
//! configuration value; no crate in the workspace depends on anything
//! *except* `waypoint-types` for these definitions.

use serde::{Deserialize, Serialize};

mod backend;
pub use backend::{LlmBackend, SttBackend, TtsBackend};

/// Transport kind of a room participant.
///
/// Mirrors the participant kinds reported by the LiveKit control plane.
/// The only kind Waypoint branches on is [`ParticipantKind::Sip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    /// A regular WebRTC participant (browser or native SDK).
    Standard,
    /// A media ingress (RTMP/WHIP) participant.
    Ingress,
    /// A media egress (recording/streaming) participant.
    Egress,
    /// A telephony participant bridged in over SIP.
    Sip,
    /// Another agent participant.
    Agent,
}

impl ParticipantKind {
    /// Returns the canonical string label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Ingress => "ingress",
            Self::Egress => "egress",
            Self::Sip => "sip",
            Self::Agent => "agent",
        }
    }
}

/// Noise-cancellation variant applied to a participant's audio input.
///
/// Resolved per participant at audio-input binding time by
/// [`NoiseCancellation::for_participant`], a pure total function of the
/// participant's transport kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseCancellation {
    /// General-purpose background voice cancellation.
    Standard,
    /// Cancellation tuned for narrowband telephony audio.
    Telephony,
}

impl NoiseCancellation {
    /// Selects the cancellation variant for a participant.
    ///
    /// SIP-origin participants get the telephony-tuned variant; every other
    /// kind gets the general-purpose one. Total over [`ParticipantKind`].
    pub fn for_participant(kind: ParticipantKind) -> Self {
        match kind {
            ParticipantKind::Sip => Self::Telephony,
            _ => Self::Standard,
        }
    }

    /// Identifier of the DSP module implementing this variant.
    pub fn module(self) -> &'static str {
        match self {
            Self::Standard => "bvc",
            Self::Telephony => "bvc-telephony",
        }
    }
}

/// Turn-detection strategy for deciding when the user has finished speaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDetector {
    /// Multilingual end-of-turn model.
    #[default]
    Multilingual,
    /// English-only end-of-turn model.
    English,
    /// Plain VAD silence heuristic, no model.
    Vad,
}

impl TurnDetector {
    /// Returns the canonical string label for this strategy.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Multilingual => "multilingual",
            Self::English => "english",
            Self::Vad => "vad",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [ParticipantKind; 5] = [
        ParticipantKind::Standard,
        ParticipantKind::Ingress,
        ParticipantKind::Egress,
        ParticipantKind::Sip,
        ParticipantKind::Agent,
    ];

    #[test]
    fn sip_participants_get_telephony_cancellation() {
        assert_eq!(
            NoiseCancellation::for_participant(ParticipantKind::Sip),
            NoiseCancellation::Telephony
        );
    }

    #[test]
    fn non_sip_participants_get_standard_cancellation() {
        for kind in ALL_KINDS {
            if kind == ParticipantKind::Sip {
                continue;
            }
            assert_eq!(
                NoiseCancellation::for_participant(kind),
                NoiseCancellation::Standard,
                "kind {:?} should map to standard cancellation",
                kind
            );
        }
    }

    #[test]
    fn cancellation_selection_is_total() {
        // Every kind resolves to one of the two variants.
        for kind in ALL_KINDS {
            let variant = NoiseCancellation::for_participant(kind);
            assert!(matches!(
                variant,
                NoiseCancellation::Standard | NoiseCancellation::Telephony
            ));
        }
    }

    #[test]
    fn cancellation_module_ids() {
        assert_eq!(NoiseCancellation::Standard.module(), "bvc");
        assert_eq!(NoiseCancellation::Telephony.module(), "bvc-telephony");
    }

    #[test]
    fn participant_kind_labels() {
        assert_eq!(ParticipantKind::Standard.as_str(), "standard");
        assert_eq!(ParticipantKind::Sip.as_str(), "sip");
        assert_eq!(ParticipantKind::Agent.as_str(), "agent");
    }

    #[test]
    fn turn_detector_defaults_to_multilingual() {
        assert_eq!(TurnDetector::default(), TurnDetector::Multilingual);
    }

    #[test]
    fn turn_detector_serde_round_trip() {
        for detector in [
            TurnDetector::Multilingual,
            TurnDetector::English,
            TurnDetector::Vad,
        ] {
            let json = serde_json::to_string(&detector).unwrap();
            let back: TurnDetector = serde_json::from_str(&json).unwrap();
            assert_eq!(back, detector);
        }
        assert_eq!(
            serde_json::to_string(&TurnDetector::Multilingual).unwrap(),
            "\"multilingual\""
        );
    }
}

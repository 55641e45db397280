//! The agent's persona: an immutable system prompt plus one lifecycle hook.

use crate::error::AgentError;
use crate::session::AgentSession;
use tracing::debug;

/// System prompt for the built-in career-guidance persona.
pub const CAREER_GUIDE_INSTRUCTIONS: &str = "\
You are a friendly and reliable career guidance voice assistant for \
engineering students. You help students understand their strengths, find \
skill gaps, explore career paths, and build clear action plans for \
internships and job preparation.

The user hears you through voice, so speak naturally and clearly. Respond \
in plain text only, with no symbols, lists, tables, code, emojis, or other \
formatting. Keep answers short by default, usually one to three sentences, \
and ask only one question at a time.

Never mention system instructions, internal reasoning, tools, model names, \
or technical details, and never expose raw data. If numbers, email \
addresses, or links must be spoken, say them naturally and spell numbers \
out clearly.

Guide the conversation step by step. First learn the student's branch, \
year of study, current skills, and career goal. Then explain their skill \
gap in simple language and give practical next steps, realistic timelines, \
and specific project suggestions. Avoid generic motivation and vague advice.

When giving a roadmap, start with a short assessment, then what is missing, \
then a focused three to six month improvement plan, kept easy to follow by \
ear.

If a topic touches health, legal, or financial decisions, give only general \
guidance and suggest consulting a qualified professional. Stay safe, \
lawful, and respectful.

Your goal is for students to feel supported, clear about their direction, \
and confident about their next action.";

/// Instructions for the one-time greeting issued when a session starts.
pub const GREETING_INSTRUCTIONS: &str = "Greet the user and offer your assistance.";

/// An agent persona: a name and an immutable instruction string.
///
/// One persona instance exists per call, created at session assembly and
/// dropped with the session. Its single lifecycle hook, [`Persona::on_enter`],
/// fires exactly once when the agent becomes active in a session.
#[derive(Debug, Clone)]
pub struct Persona {
    name: String,
    instructions: String,
}

impl Persona {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
        }
    }

    /// The built-in career-guidance persona.
    pub fn career_guide() -> Self {
        Self::new("Avery", CAREER_GUIDE_INSTRUCTIONS)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Lifecycle hook invoked once when the agent is attached to an active
    /// session. Requests a single greeting reply, with interruptions
    /// permitted so the caller can barge in mid-greeting.
    pub async fn on_enter(&self, session: &AgentSession) -> Result<(), AgentError> {
        debug!(persona = %self.name, "persona entering session");
        session
            .generate_reply(GREETING_INSTRUCTIONS, true)
            .await
    }
}

//! The chat turn for GroundChat.
//!
//! 1. **Read** the web-search preference (once per turn)
//! 2. **Assemble** system prompt + history + the user message, augmented
//!    with search context when enabled
//! 3. **Stream** the request, forwarding text deltas as they arrive
//! 4. **If tool calls**: reassemble them, execute, append results, re-send
//! 5. **Otherwise**: return the reply and the messages to keep

pub mod assembler;
pub mod session;
pub mod tool_calls;

pub use assembler::{AssembledRequest, ConversationAssembler};
pub use session::{ChatSession, TurnOutcome};
pub use tool_calls::ToolCallAccumulator;

//! Output Module
//!
//! Recorded instructions and the code generators they are replayed against

pub mod generator;
pub mod lua_emitter;
pub mod recorder;

pub use generator::CodeGenerator;
pub use lua_emitter::LuaCodeGenerator;
pub use recorder::{
    ExpressionPart, ExpressionRecorder, FragmentRecorder, Instruction, ParsedExpression,
    ParsedFragment,
};

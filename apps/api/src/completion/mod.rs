// Completion proxy: prompt in, LLM text out. No persistence.

pub mod handlers;

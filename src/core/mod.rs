pub mod assessment;
pub mod codec;
pub mod flows;
pub mod prompts;
pub mod store;

pub mod openai;
pub mod street_view;

pub use openai::OpenAiClient;
pub use street_view::StreetViewClient;

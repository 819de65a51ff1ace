pub const PAGE_TITLE: &str = "Manoj's Portfolio";

pub const PAGE_TAGLINE: &str =
    "This is a demo page. Press 'a' to chat with the AI assistant!";

pub const INSTRUCTIONS_TITLE: &str = "Instructions";

pub const INSTRUCTIONS: [&str; 4] = [
    "1. Ensure the backend is running on port 8000.",
    "2. Make sure you have added your API key in backend/.env.",
    "3. Press 'a' to open the chat assistant.",
    "4. Ask questions like \"What is this RAG-Bot project?\"",
];

pub const GREETING: &str =
    "Hi! I am the AI assistant for Manoj. Ask me anything about his projects or skills.";

pub const ASSISTANT_TITLE: &str = "Portfolio Assistant";

pub const ASSISTANT_BYLINE: &str = "Powered by RAG";

pub const INPUT_PLACEHOLDER: &str = "Ask about projects...";

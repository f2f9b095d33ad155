//! Lingua Server Library
//!
//! Backend for a language-learning assistant: OCR of study material,
//! speech-to-text for spoken practice, conversation practice and translation
//! flashcards, each a thin proxy over an external API.
//!
//! # Modules
//!
//! - `ocr`: PDF conversion jobs (submit, bounded polling, fetch) and image OCR
//! - `speech`: speech-to-text proxy
//! - `generation`: language model backend shared by chat and flashcards
//! - `chat`: guarded conversation practice
//! - `flashcard`: phrase generation and translation checking
//! - `routes`: HTTP API

pub mod chat;
pub mod config;
pub mod error;
pub mod flashcard;
pub mod generation;
pub mod ocr;
pub mod routes;
pub mod speech;
pub mod state;

//! Word selection and proficiency tracking for a vocabulary coach.
//!
//! [`coach::Coach`] is the entry point: it loads the dictionary and score
//! history from a data directory and hands out the next word to practise.

pub mod coach;
pub mod config;
pub mod dictionary;
pub mod engine;
pub mod logging;
pub mod store;

//! Engine modules: the parts of the installer that compute answers.
//!
//! The evaluator decides conditions over the pages committed so far; the
//! composer turns the enabled file directives into the output tree. Neither
//! owns session state; the wizard lends them what they need per call.

pub mod composer;
pub mod evaluator;

pub use composer::{Composer, Composition, Overwrite};
pub use evaluator::{Evaluator, FlagCache};

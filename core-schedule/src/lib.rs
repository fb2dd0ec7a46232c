//! # Content Scheduling
//!
//! Decides whether a mirrored file is currently eligible for display.
//!
//! A file's display window comes from its name first and from its embedded
//! metadata second:
//!
//! - `poster_03_03_2022.png` is shown until (and including) 3 March 2022
//! - `fair_01.03.22@15.03.22.jpg` is shown from 1 to 15 March 2022
//! - otherwise the `STARTDATE` / `ENDDATE` metadata keys are consulted
//!
//! Nothing here fails: unrecognised dates and unreadable files degrade to
//! "no constraint" and are logged.

pub mod date_parser;
pub mod evaluator;
pub mod window;

pub use date_parser::parse_date;
pub use evaluator::WindowEvaluator;
pub use window::{DateWindow, StartOnlyPolicy, WindowState};

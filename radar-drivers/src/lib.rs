//! Driver layer for the headless-browser fetch step.
//!
//! - [`browser::driver::RadarDriver`]: WebDriver client wrapper, one per fetch attempt
//! - [`browser::page::RadarPage`]: navigation with stealth scripts applied, page source
//! - [`browser::behavioral::BehavioralEngine`]: human‑like pauses between navigations
//! - [`browser::stealth`]: Chrome arguments and JS evasions per [`radar_common::StealthLevel`]
//! - [`browser::fingerprint`]: Ukrainian desktop fingerprint profiles
pub mod browser;

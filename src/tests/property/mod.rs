//! Property-based tests for the generation pipeline
//!
//! Property tests verify invariants that should hold for all inputs, rather
//! than testing specific cases.
//!
//! ## Test Modules
//!
//! - `template_props`: Prompt rendering
//!   - Parsing never panics
//!   - Substituted values appear verbatim
//!   - Conditionals follow truthiness
//!   - Rendering is deterministic
//!
//! - `contract_props`: Schema validation
//!   - Validation is idempotent
//!   - Unknown keys are stripped
//!   - List bounds are enforced exactly
//!
//! - `option_props`: Block options
//!   - Custom text resolves to its trimmed form
//!   - Whitespace-only custom text is rejected
//!   - Choice options accept exactly their listed values
//!
//! - `formatter_props`: Markup rendering
//!   - Escaped text never contains markup characters
//!   - Anchors follow list order
//!
//! ## Configuration
//!
//! By default, proptest runs 256 cases per property. This can be configured
//! via the `PROPTEST_CASES` environment variable.

mod contract_props;
mod formatter_props;
mod option_props;

//! Call descriptions and identity.
//!
//! - [`abi`]: method and contract ABI descriptions used to encode arguments and
//!   decode outcomes
//! - [`spec`]: the [`CallSpec`](spec::CallSpec) consumers issue, its resolved
//!   form and the [`CallKey`](spec::CallKey) it is cached and deduplicated under

pub mod abi;
pub mod spec;

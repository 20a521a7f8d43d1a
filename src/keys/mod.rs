mod algorithm;
mod material;
mod pem;
mod provider;
mod resolver;


pub use algorithm::{JwsAlgorithm, SignAlgorithm};
pub use material::{EcCurve, PrivateKey, PublicKey};
pub use provider::{KeyProvider, PemKeyProvider, PemKeyProviderBuilder};
pub use resolver::{resolve_signing_key, ResolvedKey};

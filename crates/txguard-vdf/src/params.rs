//! Group parameters for the Wesolowski VDF: a fixed 2048-bit RSA modulus.
//!
//! The core specification flags that the original source carried two
//! mismatched modulus constants — a hand-written ~1024-bit value in one
//! module and the real RSA-2048 constant in the worker that actually
//! proves and verifies. This crate exposes exactly one modulus, resolving
//! that ambiguity in favor of the worker's constant (see DESIGN.md): the
//! well-known public RSA-2048 Factoring Challenge number. There is no
//! constructor that accepts an alternate `N` — changing the group is a
//! deployment-level event, not a runtime parameter.

use std::sync::LazyLock;

use num_bigint::BigUint;

/// Byte width of a canonical group element at this modulus (2048 bits).
pub const MODULUS_BYTES: usize = 256;

/// Security parameter `κ`, in bits, per `spec.md` §4.E.1.
pub const SECURITY_PARAMETER_BITS: u32 = 128;

/// The RSA-2048 Factoring Challenge modulus, decimal digits verbatim.
const RSA_2048_DECIMAL: &str = "25195908475657893494027183240048398571429282126204032027777137836043662020707595556264018525880784406918290641249515082189298559149176184502808489120072844992687392807287776735971418347270261896375014971824691165077613379859095700097330459748808428401797429100642458691817195118746121515172654632282216869987549182422433637259085141865462043576798423387184774447920739934236584823824281198163815010674810451660377306056201619676256133844143603833904414952634432190114657544454178424020924616515723350778707749817125772467962926386356373289912154831438167899885040445364023527381951378636564391212010397122822120720357";

/// The fixed RSA-2048 modulus `N`. Computed once and shared by every
/// prover and verifier call in the process.
pub static MODULUS: LazyLock<BigUint> = LazyLock::new(|| {
    BigUint::parse_bytes(RSA_2048_DECIMAL.as_bytes(), 10)
        .expect("RSA-2048 modulus constant is valid decimal")
});

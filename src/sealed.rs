/// Supertrait that keeps a public trait implementable only inside this
/// crate ([`C-SEALED`]).
///
/// [`C-SEALED`]: <https://rust-lang.github.io/api-guidelines/future-proofing.html>
pub trait Sealed {}

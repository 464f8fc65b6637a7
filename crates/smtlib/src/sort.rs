/// SMT-LIB sort of a declared symbol.
///
/// Program integers and array elements live in `Int`; predicates in `Bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sort {
    /// Boolean sort
    Bool,
    /// Mathematical integer sort
    Int,
}

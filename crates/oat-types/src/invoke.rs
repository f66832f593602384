/// How a method is invoked at a call site.
///
/// Ordering is load-bearing: the oracle indexes per-`InvokeType` statistics
/// arrays by `as usize`, so don't reorder these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum InvokeType {
    Static = 0,
    Direct = 1,
    Virtual = 2,
    Super = 3,
    Interface = 4,
}

impl InvokeType {
    pub const COUNT: usize = 5;

    pub const ALL: [InvokeType; Self::COUNT] = [
        InvokeType::Static,
        InvokeType::Direct,
        InvokeType::Virtual,
        InvokeType::Super,
        InvokeType::Interface,
    ];

    pub fn as_index(self) -> usize {
        self as usize
    }

    /// True for invoke kinds that dispatch through a vtable at runtime.
    pub fn is_polymorphic(self) -> bool {
        matches!(self, InvokeType::Virtual | InvokeType::Super | InvokeType::Interface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_match_declaration_order() {
        assert_eq!(InvokeType::Static.as_index(), 0);
        assert_eq!(InvokeType::Direct.as_index(), 1);
        assert_eq!(InvokeType::Virtual.as_index(), 2);
        assert_eq!(InvokeType::Super.as_index(), 3);
        assert_eq!(InvokeType::Interface.as_index(), 4);
    }

    #[test]
    fn polymorphism_classification() {
        assert!(!InvokeType::Static.is_polymorphic());
        assert!(!InvokeType::Direct.is_polymorphic());
        assert!(InvokeType::Virtual.is_polymorphic());
        assert!(InvokeType::Super.is_polymorphic());
        assert!(InvokeType::Interface.is_polymorphic());
    }
}

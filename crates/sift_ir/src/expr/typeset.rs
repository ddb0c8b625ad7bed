use std::fmt;
use std::ops::BitOr;

/// The set of runtime value kinds an expression may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeSet(u16);

impl TypeSet {
    pub const EMPTY: TypeSet = TypeSet(0);
    pub const MISSING: TypeSet = TypeSet(1);
    pub const NULL: TypeSet = TypeSet(1 << 1);
    pub const BOOL: TypeSet = TypeSet(1 << 2);
    pub const INT: TypeSet = TypeSet(1 << 3);
    pub const FLOAT: TypeSet = TypeSet(1 << 4);
    pub const STRING: TypeSet = TypeSet(1 << 5);
    pub const LIST: TypeSet = TypeSet(1 << 6);
    pub const STRUCT: TypeSet = TypeSet(1 << 7);
    pub const ANY: TypeSet = TypeSet(0xff);

    pub const NUMERIC: TypeSet = TypeSet(Self::INT.0 | Self::FLOAT.0);

    pub fn union(self, other: TypeSet) -> TypeSet {
        TypeSet(self.0 | other.0)
    }

    /// True when every kind in `other` is also in `self`.
    pub fn contains(self, other: TypeSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TypeSet {
    type Output = TypeSet;

    fn bitor(self, other: TypeSet) -> TypeSet {
        self.union(other)
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(TypeSet, &str); 8] = [
            (TypeSet::MISSING, "missing"),
            (TypeSet::NULL, "null"),
            (TypeSet::BOOL, "bool"),
            (TypeSet::INT, "int"),
            (TypeSet::FLOAT, "float"),
            (TypeSet::STRING, "string"),
            (TypeSet::LIST, "list"),
            (TypeSet::STRUCT, "struct"),
        ];
        if *self == TypeSet::ANY {
            return write!(f, "{{any}}");
        }
        write!(f, "{{")?;
        let mut first = true;
        for (bit, name) in NAMES {
            if self.contains(bit) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        write!(f, "}}")
    }
}

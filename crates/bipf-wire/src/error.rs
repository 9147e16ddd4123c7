use crate::tag::Discriminant;

/// Boxed error returned by caller-supplied extension capabilities.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while encoding or decoding BIPF.
#[derive(Debug, thiserror::Error)]
pub enum BipfError {
    /// A tag varint ran past 64 bits.
    #[error("malformed varint tag")]
    MalformedVarint,

    /// The input ended in the middle of a value.
    #[error("unexpected end of input")]
    EndOfInput,

    /// A typed read found a different discriminant.
    #[error("type mismatch (expected {expected}, found {found})")]
    TypeMismatch {
        expected: Discriminant,
        found: Discriminant,
    },

    /// A fixed-size value declared the wrong payload length.
    #[error("invalid length for {discriminant} (expected {expected}, found {found})")]
    InvalidLength {
        discriminant: Discriminant,
        expected: u64,
        found: u64,
    },

    /// A BOOLNULL boolean payload was neither 0x00 nor 0x01.
    #[error("invalid bool payload 0x{0:02x}")]
    InvalidBool(u8),

    /// An explicit null read found a non-null value.
    #[error("expected null")]
    NotNull,

    /// A number is above the representable range of its target.
    #[error("value {value} overflows {target}")]
    Overflow { value: String, target: &'static str },

    /// A number is below the representable range of its target.
    #[error("value {value} underflows {target}")]
    Underflow { value: String, target: &'static str },

    /// Composite children ran past the composite's declared length.
    #[error("composite children exceed declared length ({consumed} of {declared} bytes)")]
    OutOfBounds { declared: u64, consumed: u64 },

    /// The nesting guard tripped.
    #[error("exceeded max nesting depth ({0})")]
    MaxDepthExceeded(usize),

    /// A decoder returned at a different nesting depth than it started at.
    #[error("unexpected mismatched nesting")]
    UnbalancedNesting,

    /// No codec exists for this map key type.
    #[error("unsupported map key type {0}")]
    UnsupportedKeyType(&'static str),

    /// No codec exists for this kind of value.
    #[error("unsupported value kind {0}")]
    UnsupportedValueKind(&'static str),

    /// The discriminant is reserved and cannot be decoded.
    #[error("unsupported discriminant {0}")]
    UnsupportedDiscriminant(Discriminant),

    /// Input remained after a complete top-level value.
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    /// A statically-typed interface target holds no concrete value.
    #[error("cannot unmarshal into nil {0}")]
    CannotUnmarshalIntoNil(&'static str),

    /// A fixed-capacity sequence received more elements than it holds.
    #[error("provided array is too short (capacity {capacity})")]
    TooShort { capacity: usize },

    /// A codec was handed a value of a type it was not built for.
    #[error("codec for {expected} received a value of another type")]
    WrongTarget { expected: &'static str },

    /// A cyclic placeholder codec was invoked before it was filled.
    #[error("codec for {0} used before construction finished")]
    Incomplete(&'static str),

    /// A caller-supplied extension capability failed.
    #[error("custom codec failed: {0}")]
    Custom(#[source] BoxError),

    /// Diagnostic wrapper carrying the bytes around the failure point.
    #[error("{source}; error found in #{offset} byte of ...|{window}|..., bigger context ...|{context}|...")]
    Annotated {
        offset: usize,
        window: String,
        context: String,
        #[source]
        source: Box<BipfError>,
    },

    /// Struct field path wrapper.
    #[error("field '{name}': {source}")]
    Field {
        name: String,
        #[source]
        source: Box<BipfError>,
    },
}

impl BipfError {
    /// The taxonomy error underneath any diagnostic or field-path wrappers.
    pub fn root(&self) -> &BipfError {
        match self {
            BipfError::Annotated { source, .. } | BipfError::Field { source, .. } => source.root(),
            other => other,
        }
    }

    /// Wrap a capability failure.
    pub fn custom(err: impl Into<BoxError>) -> Self {
        BipfError::Custom(err.into())
    }

    /// Prefix this error with a struct field name.
    pub fn in_field(self, name: &str) -> Self {
        BipfError::Field {
            name: name.to_string(),
            source: Box::new(self),
        }
    }

    pub fn is_annotated(&self) -> bool {
        match self {
            BipfError::Annotated { .. } => true,
            BipfError::Field { source, .. } => source.is_annotated(),
            _ => false,
        }
    }

    pub fn overflow<T>(value: impl ToString) -> Self {
        BipfError::Overflow {
            value: value.to_string(),
            target: std::any::type_name::<T>(),
        }
    }

    pub fn underflow<T>(value: impl ToString) -> Self {
        BipfError::Underflow {
            value: value.to_string(),
            target: std::any::type_name::<T>(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BipfError>;

/// Declares a `#[repr(transparent)]` newtype around a kernel constant, with associated constants
/// for the known values.
///
/// Unknown values are preserved.
macro_rules! ffi_enum {
    (
        $( #[$attrs:meta] )*
        $v:vis enum $name:ident: $native:ty {
            $(
                $( #[$variant_attrs:meta] )*
                $variant:ident = $value:expr
            ),+
            $(,)?
        }
    ) => {
        $( #[$attrs] )*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        $v struct $name(pub(crate) $native);

        impl $name {
            $(
                $( #[$variant_attrs] )*
                $v const $variant: Self = Self($value);
            )+

            /// Creates a value from its raw kernel representation.
            #[inline]
            #[allow(dead_code)]
            $v const fn from_raw(raw: $native) -> Self {
                Self(raw)
            }

            /// Returns the raw kernel representation.
            #[inline]
            #[allow(dead_code)]
            $v const fn raw(self) -> $native {
                self.0
            }

            #[allow(dead_code, unreachable_patterns)]
            fn variant_name(&self) -> Option<&'static str> {
                match self {
                    $(
                        &Self::$variant => Some(stringify!($variant)),
                    )*
                    _ => None,
                }
            }
        }

    };
}

/// Implements `Debug` for an [`ffi_enum!`] type, printing known values by name with `$prefix`.
macro_rules! ffi_enum_debug {
    ($name:ident, $prefix:literal) => {
        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self.variant_name() {
                    Some(name) => write!(f, "{}{name}", $prefix),
                    None => write!(f, "{}({:#x})", stringify!($name), self.0),
                }
            }
        }
    };
}

/// Declares a static table mapping kernel symbol names to their codes.
///
/// Names are spelled exactly like the `input-event-codes.h` constants.
macro_rules! code_table {
    ( $v:vis static $table:ident = [ $( $name:ident = $code:expr ),+ $(,)? ]; ) => {
        $v static $table: &[(&str, u16)] = &[
            $( (stringify!($name), $code), )+
        ];
    };
}

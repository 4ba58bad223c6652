/// Defines a newtype around a single value together with the conversions that make it usable in
/// place of the wrapped type.
///
/// ```rust,ignore
/// define_wrapper_type!(
///     #[derive(Clone, Copy, Debug, PartialEq, Eq)]
///     pub struct NodeId(u64)
///     impl Display, FromStr;
/// );
/// ```
///
/// The optional `impl` list forwards `Display` and `FromStr` to the wrapped value. Parsing
/// fails with the error of the wrapped type. Generics are not supported.
#[macro_export]
macro_rules! define_wrapper_type {
    (@forward Display, $ident: ident, $ty: ty) => {
        impl std::fmt::Display for $ident {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };

    (@forward FromStr, $ident: ident, $ty: ty) => {
        impl std::str::FromStr for $ident {
            type Err = <$ty as std::str::FromStr>::Err;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };

    (
        $(#[$meta: meta])*
        $vis:vis struct $ident: ident($ty: ty)

        $(
            impl $($forwarded: ident),*
        )?

        ;
    ) => {
        $(#[$meta])*
        $vis struct $ident($ty);

        impl $ident {
            pub fn new(value: impl Into<$ty>) -> Self {
                Self(value.into())
            }

            pub fn into_inner(self) -> $ty {
                self.0
            }

            pub fn as_inner(&self) -> &$ty {
                &self.0
            }
        }

        impl AsRef<$ty> for $ident {
            fn as_ref(&self) -> &$ty {
                &self.0
            }
        }

        impl std::ops::Deref for $ident {
            type Target = $ty;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl From<$ty> for $ident {
            fn from(value: $ty) -> Self {
                Self(value)
            }
        }

        impl From<$ident> for $ty {
            fn from(value: $ident) -> Self {
                value.0
            }
        }

        $(
            $(
                $crate::define_wrapper_type!(@forward $forwarded, $ident, $ty);
            )*
        )?
    };
}

/// Declare that local types can be stored and provided.
///
/// * `impl_value!(A, B)` declares plain values, only constructed by rules.
/// * `impl_value!(auto A, B)` declares plain values that can also be
///   constructed automatically, using their [crate::AutoProvide] implementation.
/// * `impl_value!(ref A, B)` declares shared handles, which can be injected
///   into circular fields.
/// * `impl_value!(error A, B)` declares failure types, which are never provided.
///
/// All declared types must implement ```Clone + Send + Sync + 'static```.
#[macro_export]
macro_rules! impl_value {
    (auto $($Type:ty),+ $(,)?) => {
        $(
        impl $crate::Value for $Type {
            fn initializer() -> ::std::result::Result<$crate::Initializer, $crate::ProvideError> {
                $crate::auto::dereference::<Self>()
            }
        }
        )+
    };
    (ref $($Type:ty),+ $(,)?) => {
        $(
        impl $crate::Value for $Type {
            const KIND: $crate::Kind = $crate::Kind::Reference;
        }
        )+
    };
    (error $($Type:ty),+ $(,)?) => {
        $(
        impl $crate::Value for $Type {
            const KIND: $crate::Kind = $crate::Kind::Error;
        }
        )+
    };
    ($($Type:ty),+ $(,)?) => {
        $( impl $crate::Value for $Type {} )+
    };
}

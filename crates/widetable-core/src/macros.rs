// __impl_record_shapes
// emitted by #[derive(Record)]; lets a record act as a scan destination,
// a sequence element and a flattened embed
#[doc(hidden)]
#[macro_export]
macro_rules! __impl_record_shapes {
    ($type:ty) => {
        impl $crate::traits::Destination for $type {
            type Record = Self;

            fn target(&mut self) -> $crate::traits::Target<'_, Self> {
                $crate::traits::Target::One(self)
            }
        }

        impl $crate::traits::Element for $type {
            type Record = Self;

            fn from_record(record: Self) -> Self {
                record
            }
        }

        impl $crate::traits::Embed for $type {
            type Record = Self;

            fn embedded(&self) -> ::core::option::Option<&Self> {
                ::core::option::Option::Some(self)
            }

            fn embedded_mut(&mut self) -> &mut Self {
                self
            }
        }
    };
}

// field_map
/// Build a `FieldMap` literal; values go through `Value::from`.
#[macro_export]
macro_rules! field_map {
    () => {
        $crate::value::FieldMap::new()
    };
    ( $( $name:expr => $value:expr ),+ $(,)? ) => {{
        let mut map = $crate::value::FieldMap::new();
        $(
            map.insert(
                ::std::string::String::from($name).to_ascii_lowercase(),
                $crate::value::Value::from($value),
            );
        )+
        map
    }};
}

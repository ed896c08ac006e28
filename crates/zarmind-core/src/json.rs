//! # JSON Text Columns
//!
//! Lists and free-form objects (work order images, expense receipts,
//! specifications) are stored as JSON text in a single SQLite column.
//!
//! ```text
//! JsonText(vec!["a.jpg", "b.jpg"])
//!   wire:   ["a.jpg","b.jpg"]          (transparent)
//!   column: '["a.jpg","b.jpg"]'        (TEXT)
//! ```

use serde::{Deserialize, Serialize};

/// A value stored as JSON text and serialized as itself on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonText<T>(pub T);

impl<T> JsonText<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for JsonText<T> {
    fn from(value: T) -> Self {
        JsonText(value)
    }
}

/// Keeps first occurrences, in order.
///
/// ```rust
/// use zarmind_core::json::dedup_strings;
///
/// let images = dedup_strings(["a.jpg", "b.jpg", "a.jpg"].map(String::from));
/// assert_eq!(images, vec!["a.jpg", "b.jpg"]);
/// ```
pub fn dedup_strings(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

#[cfg(feature = "sqlx")]
mod sqlite {
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use sqlx::encode::IsNull;
    use sqlx::error::BoxDynError;
    use sqlx::sqlite::{SqliteTypeInfo, SqliteValueRef};
    use sqlx::{Database, Decode, Encode, Sqlite, Type};

    use super::JsonText;

    impl<T> Type<Sqlite> for JsonText<T> {
        fn type_info() -> SqliteTypeInfo {
            <String as Type<Sqlite>>::type_info()
        }

        fn compatible(ty: &SqliteTypeInfo) -> bool {
            <String as Type<Sqlite>>::compatible(ty)
        }
    }

    impl<'q, T: Serialize> Encode<'q, Sqlite> for JsonText<T> {
        fn encode_by_ref(
            &self,
            buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
        ) -> Result<IsNull, BoxDynError> {
            let text = serde_json::to_string(&self.0)?;
            <String as Encode<'q, Sqlite>>::encode(text, buf)
        }
    }

    impl<'r, T: DeserializeOwned> Decode<'r, Sqlite> for JsonText<T> {
        fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
            let text = <&str as Decode<'r, Sqlite>>::decode(value)?;
            Ok(JsonText(serde_json::from_str(text)?))
        }
    }
}

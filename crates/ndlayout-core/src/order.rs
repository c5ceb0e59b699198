use strum_macros::{Display, EnumIter, EnumString};

/// # Order
///
/// Memory order of a shape, i.e which axis varies fastest in the flat buffer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter,
)]
pub enum Order {
    /// Last axis varies fastest ('C').
    #[default]
    #[strum(to_string = "C", serialize = "c")]
    #[cfg_attr(feature = "serde", serde(rename = "C"))]
    RowMajor,
    /// First axis varies fastest ('F').
    #[strum(to_string = "F", serialize = "f")]
    #[cfg_attr(feature = "serde", serde(rename = "F"))]
    ColumnMajor,
}

impl Order {
    pub fn as_char(self) -> char {
        match self {
            Order::RowMajor => 'C',
            Order::ColumnMajor => 'F',
        }
    }

    pub fn is_row_major(self) -> bool {
        matches!(self, Order::RowMajor)
    }
}

impl TryFrom<char> for Order {
    type Error = strum::ParseError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'C' | 'c' => Ok(Order::RowMajor),
            'F' | 'f' => Ok(Order::ColumnMajor),
            _ => Err(strum::ParseError::VariantNotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_order_notation() {
        for order in Order::iter() {
            assert_eq!(Order::try_from(order.as_char()).unwrap(), order);
            assert_eq!(Order::from_str(&order.to_string()).unwrap(), order);
        }
        assert_eq!(Order::default(), Order::RowMajor);
        assert!(Order::try_from('Z').is_err());
        assert!(Order::from_str("A").is_err());
    }
}

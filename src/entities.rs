//! Domain entities produced by the mapper stage
//!
//! [`MappedRow`] carries every checked field of a record and suits any file
//! type. [`OutboundLine`] is the typed outbound-order line used by warehouse
//! dispatch files.

use crate::error::Result;
use crate::models::FieldValue;
use crate::pipeline::{EntityMapper, RecordView};
use serde::{Serialize, Serializer};

/// Generic entity: line number plus ordered field name/value pairs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedRow {
    pub line_number: usize,
    #[serde(serialize_with = "serialize_ordered")]
    pub fields: Vec<(String, Option<FieldValue>)>,
}

impl MappedRow {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }
}

// Object keys in declared field order
fn serialize_ordered<S: Serializer>(
    fields: &[(String, Option<FieldValue>)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(fields.iter().map(|(name, value)| (name, value)))
}

/// Maps any record to a [`MappedRow`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RowMapper;

impl EntityMapper<MappedRow> for RowMapper {
    fn map(&self, record: &RecordView<'_>) -> Result<MappedRow> {
        Ok(MappedRow {
            line_number: record.line_number(),
            fields: record
                .entries()
                .map(|(name, value)| (name.to_string(), value.cloned()))
                .collect(),
        })
    }
}

/// Field names read by [`OutboundLineMapper`]
pub mod outbound_fields {
    pub const ORDER_PREFIX: &str = "ORDER_PREFIX";
    pub const ORDER_NUMBER: &str = "ORDER_NUMBER";
    pub const PRODUCT_CODE: &str = "PRODUCT_CODE";
    pub const QUANTITY: &str = "QUANTITY";
    pub const UNIT_CODE: &str = "UNIT_CODE";
    pub const ORIGIN_WAREHOUSE: &str = "ORIGIN_WAREHOUSE";
    pub const DESTINATION_WAREHOUSE: &str = "DESTINATION_WAREHOUSE";

    pub const ALL: [&str; 7] = [
        ORDER_PREFIX,
        ORDER_NUMBER,
        PRODUCT_CODE,
        QUANTITY,
        UNIT_CODE,
        ORIGIN_WAREHOUSE,
        DESTINATION_WAREHOUSE,
    ];
}

/// One line of an outbound (dispatch) order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundLine {
    pub order_prefix: String,
    pub order_number: String,
    pub product_code: String,
    pub quantity: i64,
    pub unit_code: String,
    pub origin_warehouse: String,
    pub destination_warehouse: String,
    pub line_number: usize,
    /// Source line as received
    pub line: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutboundLineMapper;

impl EntityMapper<OutboundLine> for OutboundLineMapper {
    fn map(&self, record: &RecordView<'_>) -> Result<OutboundLine> {
        use outbound_fields::*;

        Ok(OutboundLine {
            order_prefix: record.text(ORDER_PREFIX)?,
            order_number: record.text(ORDER_NUMBER)?,
            product_code: record.text(PRODUCT_CODE)?,
            quantity: record.integer(QUANTITY)?,
            unit_code: record.text(UNIT_CODE)?,
            origin_warehouse: record.text(ORIGIN_WAREHOUSE)?,
            destination_warehouse: record.text(DESTINATION_WAREHOUSE)?,
            line_number: record.line_number(),
            line: record.line().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use crate::schema::{DataType, FieldDefinition, FileType};

    fn outbound_type() -> FileType {
        let fields = outbound_fields::ALL
            .iter()
            .map(|name| {
                let data_type = if *name == outbound_fields::QUANTITY {
                    DataType::Integer
                } else {
                    DataType::Text
                };
                FieldDefinition::new(*name, data_type).required()
            })
            .collect();
        FileType::delimited("OUTBOUND", ';', fields)
    }

    fn text(v: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(v.to_string()))
    }

    #[test]
    fn test_outbound_line_mapping() {
        let file_type = outbound_type();
        let line = "PV;1001;SKU-1;12;UND;B01;B02";
        let fields: Vec<String> = line.split(';').map(str::to_string).collect();
        let values = vec![
            text("PV"),
            text("1001"),
            text("SKU-1"),
            Some(FieldValue::Integer(12)),
            text("UND"),
            text("B01"),
            text("B02"),
        ];
        let view = RecordView::new(&file_type, 3, line, &fields, &values);

        let entity = OutboundLineMapper.map(&view).unwrap();
        assert_eq!(entity.order_number, "1001");
        assert_eq!(entity.quantity, 12);
        assert_eq!(entity.destination_warehouse, "B02");
        assert_eq!(entity.line_number, 3);
    }

    #[test]
    fn test_outbound_mapping_fails_on_wrong_type() {
        let file_type = FileType::delimited(
            "WRONG",
            ';',
            vec![FieldDefinition::new("ORDER_PREFIX", DataType::Text)],
        );
        let fields = vec!["PV".to_string()];
        let values = vec![text("PV")];
        let view = RecordView::new(&file_type, 1, "PV", &fields, &values);

        let err = OutboundLineMapper.map(&view).unwrap_err();
        assert!(matches!(err, EtlError::Mapping { line: 1, .. }));
    }

    #[test]
    fn test_mapped_row_serializes_in_field_order() {
        let row = MappedRow {
            line_number: 2,
            fields: vec![
                ("Z".to_string(), Some(FieldValue::Integer(1))),
                ("A".to_string(), None),
            ],
        };
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"line_number":2,"fields":{"Z":1,"A":null}}"#
        );
        assert_eq!(row.get("Z"), Some(&FieldValue::Integer(1)));
        assert_eq!(row.get("A"), None);
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Connector-supplied SPI handles.
//!
//! The engine embeds these as opaque objects with no type marker, so each
//! capability is modelled as a trait object resolved by field shape. The
//! built-in variants below cover the `system`, `hive` and `tpch` connectors;
//! other connectors register their own through the registry builder.

use crate::ids::{ConnectorId, TransactionId};
use crate::scalar::{BucketFunctionType, HiveColumnType, SystemPartitionFunction, SystemPartitioning};
use presto_state_decode::{Decode, DecodeError, DecodeErrorKind, Decoder, Interface};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::any::Any;
use std::fmt;

/// Behavior shared by every handle variant.
pub trait Handle: fmt::Debug + Send + Sync + 'static {
    /// Registered variant name.
    fn variant(&self) -> &'static str;

    /// Wire form of the handle.
    fn to_value(&self) -> Result<Value, serde_json::Error>;

    /// Downcast hook.
    fn as_any(&self) -> &dyn Any;
}

/// How a fragment's data is spread over nodes.
pub trait ConnectorPartitioningHandle: Handle {
    /// `true` when the fragment runs on exactly one node.
    fn is_single_node(&self) -> bool;

    /// `true` when the fragment must run on the coordinator.
    fn is_coordinator_only(&self) -> bool;

    /// Short label for plan listings.
    fn label(&self) -> String;
}

/// A connector's view of the enclosing transaction.
pub trait ConnectorTransactionHandle: Handle {
    /// Transaction identifier, when the connector tracks one.
    fn transaction_id(&self) -> Option<&TransactionId>;
}

/// A connector table reference.
pub trait ConnectorTableHandle: Handle {
    /// Schema-qualified table name.
    fn schema_table_name(&self) -> SchemaTableName;
}

/// A connector column reference.
pub trait ColumnHandle: Handle {
    /// Column name as the connector knows it.
    fn column_name(&self) -> &str;
}

/// `schema.table` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaTableName {
    /// Schema name.
    pub schema: String,
    /// Table name.
    pub table: String,
}

impl fmt::Display for SchemaTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

macro_rules! capability {
    ($($iface:ident),+) => {$(
        impl Interface for dyn $iface {
            type Value = Box<dyn $iface>;
            const NAME: &'static str = stringify!($iface);
        }

        impl Decode for Box<dyn $iface> {
            fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                cx.resolve::<dyn $iface>(value)
            }
        }

        impl Serialize for dyn $iface {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.to_value().map_err(S::Error::custom)?.serialize(serializer)
            }
        }
    )+};
}

capability!(
    ConnectorPartitioningHandle,
    ConnectorTransactionHandle,
    ConnectorTableHandle,
    ColumnHandle
);

macro_rules! handle_variant {
    ($ty:ty, $name:literal) => {
        impl Handle for $ty {
            fn variant(&self) -> &'static str {
                $name
            }

            fn to_value(&self) -> Result<Value, serde_json::Error> {
                serde_json::to_value(self)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

// --- partitioning -----------------------------------------------------------

/// Engine-defined partitioning (`{partitioning, function}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemPartitioningHandle {
    /// Placement strategy.
    pub partitioning: SystemPartitioning,
    /// Row-to-partition function.
    pub function: SystemPartitionFunction,
}

handle_variant!(SystemPartitioningHandle, "system");

impl ConnectorPartitioningHandle for SystemPartitioningHandle {
    fn is_single_node(&self) -> bool {
        matches!(
            self.partitioning,
            SystemPartitioning::Single | SystemPartitioning::CoordinatorOnly
        )
    }

    fn is_coordinator_only(&self) -> bool {
        self.partitioning == SystemPartitioning::CoordinatorOnly
    }

    fn label(&self) -> String {
        self.partitioning.name().to_owned()
    }
}

impl Decode for SystemPartitioningHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            partitioning: cx.required(obj, "partitioning")?,
            function: cx.required(obj, "function")?,
        })
    }
}

/// Hive bucketed-table partitioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HivePartitioningHandle {
    /// Number of buckets.
    pub bucket_count: u32,
    /// Hash flavor.
    pub bucket_function_type: BucketFunctionType,
    /// Largest compatible bucket count, when the table allows rebucketing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_compatible_bucket_count: Option<u32>,
}

handle_variant!(HivePartitioningHandle, "hive");

impl ConnectorPartitioningHandle for HivePartitioningHandle {
    fn is_single_node(&self) -> bool {
        false
    }

    fn is_coordinator_only(&self) -> bool {
        false
    }

    fn label(&self) -> String {
        format!("hive:buckets={}", self.bucket_count)
    }
}

impl Decode for HivePartitioningHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            bucket_count: cx.required(obj, "bucketCount")?,
            bucket_function_type: cx.required(obj, "bucketFunctionType")?,
            max_compatible_bucket_count: cx.optional(obj, "maxCompatibleBucketCount")?,
        })
    }
}

/// TPC-H generator partitioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TpchPartitioningHandle {
    /// Generated table.
    pub table: String,
    /// Rows in the table.
    pub total_rows: u64,
}

handle_variant!(TpchPartitioningHandle, "tpch");

impl ConnectorPartitioningHandle for TpchPartitioningHandle {
    fn is_single_node(&self) -> bool {
        false
    }

    fn is_coordinator_only(&self) -> bool {
        false
    }

    fn label(&self) -> String {
        format!("tpch:{}", self.table)
    }
}

impl Decode for TpchPartitioningHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            table: cx.required(obj, "table")?,
            total_rows: cx.required(obj, "totalRows")?,
        })
    }
}

// --- transactions -----------------------------------------------------------

/// Hive metastore transaction (`{uuid}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HiveTransactionHandle {
    /// Transaction identifier.
    pub uuid: TransactionId,
}

handle_variant!(HiveTransactionHandle, "hive");

impl ConnectorTransactionHandle for HiveTransactionHandle {
    fn transaction_id(&self) -> Option<&TransactionId> {
        Some(&self.uuid)
    }
}

impl Decode for HiveTransactionHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            uuid: cx.required(obj, "uuid")?,
        })
    }
}

/// Engine-global transaction used by system tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSystemTransactionHandle {
    /// Owning connector.
    pub connector_id: ConnectorId,
    /// Transaction identifier.
    pub transaction_id: TransactionId,
}

handle_variant!(GlobalSystemTransactionHandle, "global-system");

impl ConnectorTransactionHandle for GlobalSystemTransactionHandle {
    fn transaction_id(&self) -> Option<&TransactionId> {
        Some(&self.transaction_id)
    }
}

impl Decode for GlobalSystemTransactionHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            connector_id: cx.required(obj, "connectorId")?,
            transaction_id: cx.required(obj, "transactionId")?,
        })
    }
}

/// Stateless transaction of connectors that proxy a remote system. Its wire
/// form is `{}`, so it is selected only when nothing more specific matches,
/// and it refuses any object that carries fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoteTransactionHandle {}

handle_variant!(RemoteTransactionHandle, "remote");

impl ConnectorTransactionHandle for RemoteTransactionHandle {
    fn transaction_id(&self) -> Option<&TransactionId> {
        None
    }
}

impl Decode for RemoteTransactionHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        if !obj.is_empty() {
            // Fields no signature claims belong to a handle we do not know.
            let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
            return Err(cx.error(DecodeErrorKind::UnknownVariant {
                interface: <dyn ConnectorTransactionHandle as Interface>::NAME,
                detail: format!("keys [{}]", keys.join(", ")),
            }));
        }
        Ok(Self {})
    }
}

// --- tables -----------------------------------------------------------------

/// TPC-H generated table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TpchTableHandle {
    /// Table name (`lineitem`, `orders`, ...).
    pub table_name: String,
    /// Data scale factor.
    pub scale_factor: f64,
}

handle_variant!(TpchTableHandle, "tpch");

impl ConnectorTableHandle for TpchTableHandle {
    fn schema_table_name(&self) -> SchemaTableName {
        // The connector names schemas after their scale factor.
        let schema = if (self.scale_factor - 0.01).abs() < f64::EPSILON {
            "tiny".to_owned()
        } else {
            format!("sf{}", self.scale_factor)
        };
        SchemaTableName {
            schema,
            table: self.table_name.clone(),
        }
    }
}

impl Decode for TpchTableHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            table_name: cx.required(obj, "tableName")?,
            scale_factor: cx.required(obj, "scaleFactor")?,
        })
    }
}

/// Hive metastore table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveTableHandle {
    /// Schema (database) name.
    pub schema_name: String,
    /// Table name.
    pub table_name: String,
}

handle_variant!(HiveTableHandle, "hive");

impl ConnectorTableHandle for HiveTableHandle {
    fn schema_table_name(&self) -> SchemaTableName {
        SchemaTableName {
            schema: self.schema_name.clone(),
            table: self.table_name.clone(),
        }
    }
}

impl Decode for HiveTableHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            schema_name: cx.required(obj, "schemaName")?,
            table_name: cx.required(obj, "tableName")?,
        })
    }
}

/// Engine system table (`system.runtime.queries`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemTableHandle {
    /// Owning connector.
    pub connector_id: ConnectorId,
    /// Schema name.
    pub schema_name: String,
    /// Table name.
    pub table_name: String,
}

handle_variant!(SystemTableHandle, "system");

impl ConnectorTableHandle for SystemTableHandle {
    fn schema_table_name(&self) -> SchemaTableName {
        SchemaTableName {
            schema: self.schema_name.clone(),
            table: self.table_name.clone(),
        }
    }
}

impl Decode for SystemTableHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            connector_id: cx.required(obj, "connectorId")?,
            schema_name: cx.required(obj, "schemaName")?,
            table_name: cx.required(obj, "tableName")?,
        })
    }
}

// --- columns ----------------------------------------------------------------

/// System table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemColumnHandle {
    /// Column name.
    pub column_name: String,
}

handle_variant!(SystemColumnHandle, "system");

impl ColumnHandle for SystemColumnHandle {
    fn column_name(&self) -> &str {
        &self.column_name
    }
}

impl Decode for SystemColumnHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            column_name: cx.required(obj, "columnName")?,
        })
    }
}

/// TPC-H generated column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TpchColumnHandle {
    /// Column name.
    pub column_name: String,
    /// SQL type signature.
    #[serde(rename = "type")]
    pub column_type: String,
}

handle_variant!(TpchColumnHandle, "tpch");

impl ColumnHandle for TpchColumnHandle {
    fn column_name(&self) -> &str {
        &self.column_name
    }
}

impl Decode for TpchColumnHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            column_name: cx.required(obj, "columnName")?,
            column_type: cx.required(obj, "type")?,
        })
    }
}

/// Hive metastore column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveColumnHandle {
    /// Column name.
    pub name: String,
    /// Hive type name (`bigint`, `array<string>`, ...).
    pub hive_type: String,
    /// Ordinal in the table schema; negative for synthesized columns.
    pub hive_column_index: i32,
    /// Column role.
    pub column_type: HiveColumnType,
    /// Column comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

handle_variant!(HiveColumnHandle, "hive");

impl ColumnHandle for HiveColumnHandle {
    fn column_name(&self) -> &str {
        &self.name
    }
}

impl Decode for HiveColumnHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            name: cx.required(obj, "name")?,
            hive_type: cx.required(obj, "hiveType")?,
            hive_column_index: cx.required(obj, "hiveColumnIndex")?,
            column_type: cx.required(obj, "columnType")?,
            comment: cx.optional(obj, "comment")?,
        })
    }
}

// --- engine wrappers --------------------------------------------------------

/// Engine-level partitioning handle wrapping the connector's.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitioningHandle {
    /// Connector that owns the handle; absent for system partitioning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<ConnectorId>,
    /// Transaction the handle was created in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_handle: Option<Box<dyn ConnectorTransactionHandle>>,
    /// Connector-specific partitioning.
    pub connector_handle: Box<dyn ConnectorPartitioningHandle>,
}

impl PartitioningHandle {
    /// Delegates to the connector handle.
    pub fn is_single_node(&self) -> bool {
        self.connector_handle.is_single_node()
    }

    /// Delegates to the connector handle.
    pub fn is_coordinator_only(&self) -> bool {
        self.connector_handle.is_coordinator_only()
    }
}

impl Decode for PartitioningHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            connector_id: cx.optional(obj, "connectorId")?,
            transaction_handle: cx.optional(obj, "transactionHandle")?,
            connector_handle: cx.required(obj, "connectorHandle")?,
        })
    }
}

/// Engine-level table handle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableHandle {
    /// Owning connector.
    pub connector_id: ConnectorId,
    /// Connector-specific table.
    pub connector_handle: Box<dyn ConnectorTableHandle>,
    /// Transaction the table was resolved in.
    pub transaction: Box<dyn ConnectorTransactionHandle>,
}

impl Decode for TableHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            connector_id: cx.required(obj, "connectorId")?,
            connector_handle: cx.required(obj, "connectorHandle")?,
            transaction: cx.required(obj, "transaction")?,
        })
    }
}

/// Binding of one partitioning function argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ArgumentBinding {
    /// Output symbol.
    Column(String),
    /// Constant value.
    Constant(Value),
}

impl Decode for ArgumentBinding {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        if obj.contains_key("column") {
            return cx.required(obj, "column").map(Self::Column);
        }
        match obj.get("constant") {
            Some(constant) => Ok(Self::Constant(constant.clone())),
            None => Err(cx.malformed("argument binding needs `column` or `constant`")),
        }
    }
}

/// Partitioning applied to an exchange or fragment output.
#[derive(Debug, Serialize)]
pub struct Partitioning {
    /// Partitioning handle.
    pub handle: PartitioningHandle,
    /// Function arguments.
    pub arguments: Vec<ArgumentBinding>,
}

impl Decode for Partitioning {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            handle: cx.required(obj, "handle")?,
            arguments: cx.required(obj, "arguments")?,
        })
    }
}

/// Partitioning plus output column order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitioningScheme {
    /// Partitioning.
    pub partitioning: Partitioning,
    /// Output symbols, in order.
    pub output_layout: Vec<String>,
}

impl Decode for PartitioningScheme {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            partitioning: cx.required(obj, "partitioning")?,
            output_layout: cx.required(obj, "outputLayout")?,
        })
    }
}

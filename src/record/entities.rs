//! The entity catalog: every dataset the pipeline mirrors, with its source
//! model, destination table, staging chunk size, and field transforms.
//!
//! Catalog order is processing order. Field order is column order in the
//! destination table; the `id` column is always prepended.

use self::FieldKind::{Relation, RelationAs, RelationId, RelationName, Scalar, Timestamp};

/// How a source field maps onto destination columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single column, value coerced to a string (null stays null).
    Scalar,
    /// Single column, datetime normalized to canonical UTC form.
    Timestamp,
    /// `[id, name]` pair expanded into `<field>_id` and `<field>_name`.
    Relation,
    /// Like `Relation`, but columns are named `<base>_id` and `<base>_name`.
    RelationAs(&'static str),
    /// Single column holding the relation id only.
    RelationId,
    /// Single column holding the relation display name only.
    RelationName,
}

/// A single source field and its transform.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub source: &'static str,
    pub kind: FieldKind,
}

const fn field(source: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { source, kind }
}

/// One dataset mirrored by the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct EntitySpec {
    /// Source model name, e.g. "sale.order".
    pub model: &'static str,
    /// Destination table name, also used for the staging object.
    pub table: &'static str,
    /// Number of rows serialized per staging write.
    pub chunk_size: usize,
    pub fields: &'static [FieldSpec],
}

impl EntitySpec {
    /// Field names to request from the source API.
    pub fn requested_fields(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.source).collect()
    }

    /// Destination column names, in order. `id` always comes first.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.fields.len() + 1);
        columns.push("id".to_string());
        for field in self.fields {
            match field.kind {
                Relation => {
                    columns.push(format!("{}_id", field.source));
                    columns.push(format!("{}_name", field.source));
                }
                RelationAs(base) => {
                    columns.push(format!("{base}_id"));
                    columns.push(format!("{base}_name"));
                }
                _ => columns.push(field.source.to_string()),
            }
        }
        columns
    }

    /// Path of the staging object for this entity, relative to the bucket.
    pub fn staging_path(&self) -> String {
        format!("temp/{}_data.json", self.table)
    }
}

/// Look up an entity by destination table name.
pub fn find(table: &str) -> Option<&'static EntitySpec> {
    CATALOG.iter().find(|e| e.table == table)
}

const SALES_ORDERS: &[FieldSpec] = &[
    field("name", Scalar),
    field("date_order", Timestamp),
    field("expected_date", Timestamp),
    field("partner_id", RelationName),
    field("user_id", RelationName),
    field("team_id", RelationName),
    field("amount_untaxed", Scalar),
    field("amount_tax", Scalar),
    field("amount_total", Scalar),
    field("write_date", Timestamp),
    field("create_date", Timestamp),
    field("warehouse_id", RelationName),
    field("amount_to_invoice", Scalar),
    field("client_order_ref", Scalar),
    field("invoice_status", Scalar),
    field("delivery_status", Scalar),
    field("state", Scalar),
];

const SALES_ORDER_LINE: &[FieldSpec] = &[
    field("product_id", Relation),
    field("product_template_id", Relation),
    field("name", Scalar),
    field("stock_item_note", Scalar),
    field("warehouses_id", Relation),
    field("free_qty_today", Scalar),
    field("route_id", RelationId),
    field("product_uom_qty", Scalar),
    field("qty_delivered", Scalar),
    field("qty_invoiced", Scalar),
    field("product_uom", Relation),
    field("customer_lead", Scalar),
    field("product_packaging_qty", Scalar),
    field("product_packaging_id", RelationId),
    field("price_unit", Scalar),
    field("tax_id", RelationId),
    field("price_subtotal", Scalar),
    field("price_total", Scalar),
];

const PURCHASE_ORDERS: &[FieldSpec] = &[
    field("partner_id", Relation),
    field("user_id", Relation),
    field("name", Scalar),
    field("partner_ref", Scalar),
    field("origin", Scalar),
    field("amount_untaxed", Scalar),
    field("amount_total", Scalar),
    field("state", Scalar),
    field("invoice_status", Scalar),
    field("date_order", Timestamp),
    field("write_date", Timestamp),
    field("create_date", Timestamp),
];

const PURCHASE_ORDER_LINE: &[FieldSpec] = &[
    field("product_id", Relation),
    field("product_uom", Relation),
    field("name", Scalar),
    field("product_qty", Scalar),
    field("qty_received", Scalar),
    field("qty_invoiced", Scalar),
    field("product_packaging_qty", Scalar),
    field("product_packaging_id", RelationId),
    field("price_unit", Scalar),
    field("taxes_id", RelationId),
    field("discount", Scalar),
    field("price_subtotal", Scalar),
    field("price_total", Scalar),
    field("date_planned", Timestamp),
];

const ACCOUNTS: &[FieldSpec] = &[
    field("partner_id", Relation),
    field("team_id", Relation),
    field("journal_id", Relation),
    field("currency_id", Relation),
    field("name", Scalar),
    field("invoice_partner_display_name", Scalar),
    field("invoice_user_id", RelationId),
    field("invoice_payment_term_id", RelationId),
    field("invoice_origin", Scalar),
    field("amount_untaxed_signed", Scalar),
    field("amount_tax_signed", Scalar),
    field("amount_total_signed", Scalar),
    field("amount_total_in_currency_signed", Scalar),
    field("amount_residual_signed", Scalar),
    field("payment_state", Scalar),
    field("state", Scalar),
    field("ref", Scalar),
    field("to_check", Scalar),
    field("payment_reference", Scalar),
    field("warehouse_id", RelationId),
    field("date", Timestamp),
    field("invoice_date", Timestamp),
    field("delivery_date", Timestamp),
    field("invoice_date_due", Timestamp),
    field("write_date", Timestamp),
    field("create_date", Timestamp),
    field("activity_ids", RelationId),
];

const ACCOUNT_MOVE_LINES: &[FieldSpec] = &[
    field("product_id", Relation),
    field("product_template_id", RelationId),
    field("product_uom_id", RelationAs("product_uom")),
    field("move_id", Relation),
    field("name", Scalar),
    field("stock_item_note", Scalar),
    field("price_unit", Scalar),
    field("quantity", Scalar),
    field("rrp_price", Scalar),
    field("tax_ids", RelationId),
    field("price_subtotal", Scalar),
    field("deferred_start_date", Timestamp),
    field("deferred_end_date", Timestamp),
    field("discount", Scalar),
    field("before_rebate_price", Scalar),
    field("rebate_perc", Scalar),
    field("after_rebate_price", Scalar),
];

const STOCK_INVENTORY: &[FieldSpec] = &[
    field("location_id", Relation),
    field("partner_id", Relation),
    field("location_dest_id", Relation),
    field("product_id", Relation),
    field("name", Scalar),
    field("origin", Scalar),
    field("user_id", RelationId),
    field("total_value", Scalar),
    field("product_quantity", Scalar),
    field("state", Scalar),
    field("date_done", Timestamp),
    field("write_date", Timestamp),
    field("create_date", Timestamp),
];

const CONTACTS: &[FieldSpec] = &[
    field("name", Scalar),
    field("cust_category_id", RelationId),
    field("contact_type", Scalar),
    field("stop_supply", Scalar),
    field("write_date", Timestamp),
    field("create_date", Timestamp),
];

const MANUFACTURING: &[FieldSpec] = &[
    field("name", Scalar),
    field("date_start", Timestamp),
    field("date_finished", Timestamp),
    field("date_deadline", Timestamp),
    field("origin", Scalar),
    field("components_availability", Scalar),
    field("reservation_state", Scalar),
    field("product_qty", Scalar),
    field("state", Scalar),
    field("product_id", Relation),
    field("bom_id", Relation),
    field("product_uom_id", Relation),
    field("lot_producing_id", RelationId),
    field("batch_production_id", RelationId),
    field("user_id", RelationId),
    field("write_date", Timestamp),
    field("create_date", Timestamp),
];

/// All mirrored entities, in processing order.
pub const CATALOG: &[EntitySpec] = &[
    EntitySpec {
        model: "sale.order",
        table: "sales_orders",
        chunk_size: 1,
        fields: SALES_ORDERS,
    },
    EntitySpec {
        model: "sale.order.line",
        table: "sales_order_line",
        chunk_size: 1,
        fields: SALES_ORDER_LINE,
    },
    EntitySpec {
        model: "purchase.order",
        table: "purchase_orders",
        chunk_size: 1,
        fields: PURCHASE_ORDERS,
    },
    EntitySpec {
        model: "purchase.order.line",
        table: "purchase_order_line",
        chunk_size: 1,
        fields: PURCHASE_ORDER_LINE,
    },
    EntitySpec {
        model: "account.move",
        table: "accounts",
        chunk_size: 200,
        fields: ACCOUNTS,
    },
    EntitySpec {
        model: "account.move.line",
        table: "account_move_lines",
        chunk_size: 200,
        fields: ACCOUNT_MOVE_LINES,
    },
    EntitySpec {
        model: "stock.picking",
        table: "stock_inventory",
        chunk_size: 1,
        fields: STOCK_INVENTORY,
    },
    EntitySpec {
        model: "res.partner",
        table: "contacts",
        chunk_size: 1,
        fields: CONTACTS,
    },
    EntitySpec {
        model: "mrp.production",
        table: "manufacturing",
        chunk_size: 1,
        fields: MANUFACTURING,
    },
];

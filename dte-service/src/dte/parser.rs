//! DTE document normalizer.

use anyhow::Context;
use chrono::NaiveDate;
use contab_core::error::AppError;
use tracing::instrument;

use crate::dte::tree::{find_node, parse_tree, XmlValue};
use crate::models::DocumentRecord;

/// Issuer display name used when the XML carries none.
const UNNAMED_SUPPLIER: &str = "Proveedor sin nombre";

/// Parse a raw DTE XML payload into a canonical document record.
///
/// Two-phase lookup: the "Encabezado" header is located with a recursive
/// depth-first search (envelope nesting and namespace prefixes vary
/// between emitters), while "IdDoc", "Emisor" and "Totales" are read as
/// direct children of it (their placement is structurally stable).
///
/// The issue date is mandatory and strictly `%Y-%m-%d`; monetary fields
/// coerce leniently to `0.0` so a partially malformed totals block does
/// not block ingestion of the document's identifying metadata. Any
/// failure is reported as a single [`AppError::Parse`] carrying the
/// source filename.
#[instrument(skip(xml), fields(source = %source_name, bytes = xml.len()))]
pub fn parse_dte(xml: &[u8], source_name: &str) -> Result<DocumentRecord, AppError> {
    parse_inner(xml, source_name).map_err(|cause| AppError::parse(source_name, cause))
}

fn parse_inner(xml: &[u8], source_name: &str) -> anyhow::Result<DocumentRecord> {
    let tree = parse_tree(xml)?;

    let encabezado =
        find_node(&tree, "Encabezado").context("no 'Encabezado' node found in the XML")?;

    let id_doc = encabezado.get("IdDoc");
    let emisor = encabezado.get("Emisor");
    let totales = encabezado.get("Totales");

    let fecha_raw = child_text(id_doc, "FchEmis").context("missing 'FchEmis' issue date")?;
    let fecha_emision = NaiveDate::parse_from_str(fecha_raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid 'FchEmis' date: {fecha_raw:?}"))?;

    let razon_social = child_text(emisor, "RznSoc")
        .map(|name| name.trim().to_string())
        .unwrap_or_else(|| UNNAMED_SUPPLIER.to_string());

    Ok(DocumentRecord {
        folio: trimmed(id_doc, "Folio"),
        tipo_dte: trimmed(id_doc, "TipoDTE"),
        fecha_emision,
        rut_emisor: trimmed(emisor, "RUTEmisor"),
        razon_social,
        monto_neto: lenient_f64(totales, "MntNeto"),
        monto_iva: lenient_f64(totales, "IVA"),
        monto_total: lenient_f64(totales, "MntTotal"),
        source_file: source_name.to_string(),
    })
}

fn child_text<'a>(node: Option<&'a XmlValue>, key: &str) -> Option<&'a str> {
    node.and_then(|n| n.get(key)).and_then(XmlValue::text)
}

fn trimmed(node: Option<&XmlValue>, key: &str) -> String {
    child_text(node, key).unwrap_or_default().trim().to_string()
}

/// Lenient monetary coercion: absent or non-numeric values become 0.0.
/// A balance mismatch downstream is a business-review discrepancy, not
/// an ingestion failure.
fn lenient_f64(node: Option<&XmlValue>, key: &str) -> f64 {
    child_text(node, key)
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

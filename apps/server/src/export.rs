//! # Exports
//!
//! Pure formatting of already-loaded data: the sales report as CSV and a
//! sale as a PDF invoice. No database access here.
//!
//! ## Invoice Layout
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ MediSync Pharmacy                        │
//! │ Invoice: INV-20261016-000042             │
//! │ Date: 2026-10-16 14:05                   │
//! │ Customer: Walk-in Customer               │
//! │                                          │
//! │ Paracetamol 500mg - 2 x $2.99            │
//! │ Cetirizine 10mg - 1 x $1.50              │
//! │                                          │
//! │ Total Amount: $7.48                      │
//! └──────────────────────────────────────────┘
//! ```

use csv::WriterBuilder;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::error::ApiError;
use medisync_core::report::SalesReportRow;
use medisync_core::{Money, SaleDetail};

pub const SALES_CSV_HEADER: [&str; 6] = [
    "Invoice",
    "Date",
    "Customer",
    "Items",
    "Total Amount",
    "Payment Method",
];

// =============================================================================
// CSV
// =============================================================================

/// Renders sales report rows as CSV with a header line.
pub fn sales_report_csv(rows: &[SalesReportRow]) -> Result<Vec<u8>, ApiError> {
    let mut wtr = WriterBuilder::new().from_writer(vec![]);

    wtr.write_record(SALES_CSV_HEADER)
        .map_err(ApiError::internal)?;

    for row in rows {
        let items = row.items.to_string();
        let total = Money::from_cents(row.total_amount_cents).to_decimal_string();
        let customer = harden_field(&row.customer);
        wtr.write_record([
            row.invoice_number.as_str(),
            row.date.as_str(),
            customer.as_str(),
            items.as_str(),
            total.as_str(),
            row.payment_method.as_str(),
        ])
        .map_err(ApiError::internal)?;
    }

    wtr.into_inner().map_err(ApiError::internal)
}

/// Customer names are free text; keep spreadsheets from evaluating them.
fn harden_field(field: &str) -> String {
    match field.trim_start().chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{}", field),
        _ => field.to_string(),
    }
}

// =============================================================================
// PDF
// =============================================================================

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const LEADING: i64 = 18;
const TITLE: &str = "MediSync Pharmacy";

/// Text rows that fit between the top and bottom margins. The title takes
/// the first row of page one.
const ROWS_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

/// Renders an invoice PDF, continuing onto further pages when the items
/// outgrow the first one.
pub fn invoice_pdf(detail: &SaleDetail) -> Result<Vec<u8>, ApiError> {
    let sale = &detail.sale;

    let mut lines: Vec<String> = vec![
        format!("Invoice: {}", sale.invoice_number),
        format!("Date: {}", sale.display_date()),
        format!("Customer: {}", sale.customer_name),
        String::new(),
    ];
    lines.extend(
        detail
            .items
            .iter()
            .map(|item| format!("{} - {} x {}", item.medicine_name, item.quantity, item.unit_price())),
    );
    lines.push(String::new());
    lines.push(format!("Total Amount: {}", sale.final_amount()));

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for (index, chunk) in paginate(&lines).into_iter().enumerate() {
        let title = (index == 0).then_some(TITLE);
        let content = Content {
            operations: page_operations(title, chunk),
        }
        .encode()
        .map_err(ApiError::internal)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf).map_err(ApiError::internal)?;
    Ok(buf)
}

/// Splits body lines into page-sized chunks, leaving room for the title on
/// the first page.
fn paginate(lines: &[String]) -> Vec<&[String]> {
    let (first, mut rest) = lines.split_at(lines.len().min(ROWS_PER_PAGE - 1));
    let mut chunks = vec![first];
    while !rest.is_empty() {
        let (chunk, tail) = rest.split_at(rest.len().min(ROWS_PER_PAGE));
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

fn page_operations(title: Option<&str>, lines: &[String]) -> Vec<Operation> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("TL", vec![LEADING.into()]),
        Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN - 10).into()]),
    ];
    if let Some(title) = title {
        operations.push(Operation::new("Tf", vec!["F1".into(), 18_i64.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(title)]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("Tf", vec!["F1".into(), 11_i64.into()]));
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));
    operations
}

use chrono::NaiveDate;
use std::error::Error;

use crate::format::format_number;
use crate::row::{Field, ReportRow, Totals, calculate_itog, filter_active_rows};

/// Title used when the report has no name yet.
pub const DEFAULT_TITLE: &str = "Achot Hisoboti";
const FILE_STEM: &str = "hisobot";

/// Everything an exported document shows: header, active rows, footer.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportDocument {
    pub title: String,
    pub date: NaiveDate,
    pub owner: Option<String>,
    pub rows: Vec<ReportRow>,
    pub totals: Totals,
}

impl ExportDocument {
    /// Build a document from the grid rows
    ///
    /// Blank rows are dropped before anything else so they never reach the
    /// document; the footer totals are computed over the remaining rows.
    ///
    /// # Arguments
    /// * `name` - Report name; blank falls back to [`DEFAULT_TITLE`]
    /// * `date` - Report date shown under the title
    /// * `rows` - All rows of the grid
    pub fn new(name: &str, date: NaiveDate, rows: &[ReportRow]) -> Self {
        let rows = filter_active_rows(rows);
        let totals = Totals::compute(&rows);
        let title = if name.trim().is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            name.trim().to_string()
        };
        ExportDocument {
            title,
            date,
            owner: None,
            rows,
            totals,
        }
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    /// Download name, e.g. `Fevral-2024-02-29.pdf`.
    pub fn file_name(&self, extension: &str) -> String {
        let stem = if self.title == DEFAULT_TITLE {
            FILE_STEM.to_string()
        } else {
            sanitize_filename(&self.title)
        };
        format!("{}-{}.{}", stem, self.date.format("%Y-%m-%d"), extension)
    }

    /// Header captions: N, the row fields, ITOG.
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["N".to_string()];
        header.extend(Field::ALL.iter().map(|f| f.caption().to_string()));
        header.push("ITOG".to_string());
        header
    }

    /// Body cells as displayed, numbers grouped, unset shown as "0".
    pub fn body(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let mut cells = vec![(index + 1).to_string(), row.sabablar.clone()];
                for field in Field::NUMERIC {
                    let shown = format_number(row.value(field));
                    cells.push(shown);
                }
                cells.push(format_number(calculate_itog(row)));
                cells
            })
            .collect()
    }

    /// Footer cells: row count, "JAMI", column sums, grand itog.
    pub fn footer(&self) -> Vec<String> {
        let mut cells = vec![self.totals.row_count.to_string(), "JAMI".to_string()];
        for field in Field::NUMERIC {
            cells.push(format_number(self.totals.column(field)));
        }
        cells.push(format_number(self.totals.itog));
        cells
    }
}

/// Render the report as CSV
///
/// Fields containing commas, quotes or newlines are quoted with embedded
/// quotes doubled.
///
/// # Returns
/// * `Result<String, Box<dyn Error>>` - CSV content as a string or an error
pub fn render_csv(doc: &ExportDocument) -> Result<String, Box<dyn Error>> {
    let mut csv_content = String::new();

    let mut lines = vec![doc.header()];
    lines.extend(doc.body());
    lines.push(doc.footer());

    for line in lines {
        for (i, value) in line.iter().enumerate() {
            if i > 0 {
                csv_content.push(',');
            }
            if value.contains(',') || value.contains('"') || value.contains('\n') {
                let escaped = value.replace('"', "\"\"");
                csv_content.push_str(&format!("\"{}\"", escaped));
            } else {
                csv_content.push_str(value);
            }
        }
        csv_content.push('\n');
    }

    Ok(csv_content)
}

/// Render the report as an XLSX workbook
///
/// Title and date go in the first two rows, the table starts on the fourth.
/// Numbers are written as numbers so the sheet stays computable.
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes or an error
pub fn render_spreadsheet(doc: &ExportDocument) -> Result<Vec<u8>, Box<dyn Error>> {
    use rust_xlsxwriter::{Format, Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    let bold = Format::new().set_bold();

    worksheet.set_name("Hisobot")?;
    worksheet.write_string_with_format(0, 0, &doc.title, &bold)?;
    worksheet.write_string(1, 0, &format!("Sana: {}", doc.date.format("%Y-%m-%d")))?;

    let header_row = 3;
    for (c, caption) in doc.header().iter().enumerate() {
        worksheet.write_string_with_format(header_row, c as u16, caption, &bold)?;
    }
    worksheet.set_column_width(1, 32.0)?;

    for (r, row) in doc.rows.iter().enumerate() {
        let line = header_row + 1 + r as u32;
        worksheet.write_number(line, 0, (r + 1) as f64)?;
        worksheet.write_string(line, 1, &row.sabablar)?;
        for (offset, field) in Field::NUMERIC.iter().enumerate() {
            worksheet.write_number(line, 2 + offset as u16, row.value(*field) as f64)?;
        }
        worksheet.write_number(line, 8, calculate_itog(row) as f64)?;
    }

    let footer_row = header_row + 1 + doc.rows.len() as u32;
    worksheet.write_number_with_format(footer_row, 0, doc.totals.row_count as f64, &bold)?;
    worksheet.write_string_with_format(footer_row, 1, "JAMI", &bold)?;
    for (offset, field) in Field::NUMERIC.iter().enumerate() {
        worksheet.write_number_with_format(
            footer_row,
            2 + offset as u16,
            doc.totals.column(*field) as f64,
            &bold,
        )?;
    }
    worksheet.write_number_with_format(footer_row, 8, doc.totals.itog as f64, &bold)?;

    workbook.push_worksheet(worksheet);

    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 14.0;
const LINE_HEIGHT: f32 = 7.0;
// x offsets (mm) of the nine table columns on a landscape A4 page
const COLUMNS: [f32; 9] = [14.0, 26.0, 96.0, 122.0, 146.0, 172.0, 198.0, 222.0, 250.0];

fn push_row(
    layer: &printpdf::PdfLayerReference,
    font: &printpdf::IndirectFontRef,
    cells: &[String],
    y: f32,
) {
    use printpdf::Mm;
    for (cell, x) in cells.iter().zip(COLUMNS) {
        layer.use_text(cell.as_str(), 10.0, Mm(x), Mm(y), font);
    }
}

/// Render the report as a landscape A4 PDF
///
/// The table continues on new pages when it runs past the bottom margin;
/// the header row is repeated on every page and the grand ITOG closes the
/// document.
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - PDF file content as bytes or an error
pub fn render_pdf(doc: &ExportDocument) -> Result<Vec<u8>, Box<dyn Error>> {
    use printpdf::{BuiltinFont, Mm, PdfDocument};

    let (pdf, page1, layer1) =
        PdfDocument::new(&doc.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = pdf.add_builtin_font(BuiltinFont::Helvetica)?;
    let font_bold = pdf.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut layer = pdf.get_page(page1).get_layer(layer1);
    let mut y = PAGE_HEIGHT - 20.0;

    layer.use_text(doc.title.as_str(), 22.0, Mm(MARGIN), Mm(y), &font_bold);
    y -= 8.0;
    let date_line = format!("Sana: {}", doc.date.format("%Y-%m-%d"));
    layer.use_text(date_line.as_str(), 12.0, Mm(MARGIN), Mm(y), &font);
    if let Some(owner) = &doc.owner {
        y -= 6.0;
        let owner_line = format!("Foydalanuvchi: {}", owner);
        layer.use_text(owner_line.as_str(), 12.0, Mm(MARGIN), Mm(y), &font);
    }
    y -= 11.0;

    let header = doc.header();
    push_row(&layer, &font_bold, &header, y);
    y -= LINE_HEIGHT;

    for cells in doc.body() {
        if y < MARGIN + LINE_HEIGHT {
            let (page, page_layer) = pdf.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = pdf.get_page(page).get_layer(page_layer);
            y = PAGE_HEIGHT - 20.0;
            push_row(&layer, &font_bold, &header, y);
            y -= LINE_HEIGHT;
        }
        push_row(&layer, &font, &cells, y);
        y -= LINE_HEIGHT;
    }

    if y < MARGIN + 3.0 * LINE_HEIGHT {
        let (page, page_layer) = pdf.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        layer = pdf.get_page(page).get_layer(page_layer);
        y = PAGE_HEIGHT - 20.0;
    }
    push_row(&layer, &font_bold, &doc.footer(), y);
    y -= 2.0 * LINE_HEIGHT;

    let grand = format!("ITOG  {}", format_number(doc.totals.itog));
    layer.use_text(grand.as_str(), 20.0, Mm(MARGIN), Mm(y), &font_bold);

    let mut writer = std::io::BufWriter::new(Vec::<u8>::new());
    pdf.save(&mut writer)?;
    Ok(writer.into_inner()?)
}

fn sanitize_filename(input: &str) -> String {
    let out: String = input
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || ch == '-' || ch == '_' || ch == '.' || ch == ' ' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = out.trim().to_string();
    if trimmed.is_empty() {
        FILE_STEM.to_string()
    } else {
        trimmed
    }
}

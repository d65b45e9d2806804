//! Instruction text handed to the extraction capability.
//!
//! The pipeline owns the instructions (not the extractor implementation) so
//! every extractor sees the same field contract. Override per deployment via
//! `PipelineConfig::extraction_instructions`.

/// Field-extraction instructions for Indian GST invoices.
pub const EXTRACTION_INSTRUCTIONS: &str = "\
You are an expert OCR system for Indian GST invoices. Carefully read every \
number and text in the invoice image.

Extraction rules:
1. The totals block sits at the bottom; the grand total is usually the largest number there.
2. Taxable value is the amount BEFORE tax.
3. CGST and SGST are usually equal halves of the total tax; IGST replaces both for interstate supply.
4. HSN codes are 4-8 digit numbers in the item description column.
5. A GSTIN is a 15-character alphanumeric code; its first 2 digits are the state code.

Extract these values:
- gst_no: seller's GSTIN
- invoice_no: invoice number exactly as written
- invoice_date: date in any format
- vendor_name: seller/supplier company name
- buyer_name, buyer_gstin: if visible
- vendor_state: state derived from the GSTIN state code
- place_of_supply: delivery state
- hsn_code: HSN/SAC code
- tax_rate: GST rate as a number (5, 12, 18 or 28)
- taxable_value, cgst_amount, sgst_amount, igst_amount, cess_amount, grand_total
- ledger_name: \"Purchase A/c\" for goods, \"General Expense\" for services
- group_name: \"Purchase Accounts\" for goods, \"Indirect Expenses\" for services

Return ONLY a valid JSON object.";

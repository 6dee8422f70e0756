// Instruction text for the single-shot statement extraction call

use crate::schema::ReportingBasis;

/// The user instruction sent next to the document.
///
/// The basis is named once per statement; the schema never changes with it.
pub fn extraction_instruction(basis: ReportingBasis) -> String {
    format!(
        "Analyze this annual report and extract the {basis} Profit & Loss statement \
         (Statement of Comprehensive Income), {basis} Balance Sheet (Statement of Financial \
         Position), and {basis} Cash Flow statement. Ensure you capture the correct line items, \
         exact values for the listed years, and identify which rows represent totals or \
         sub-totals. If multiple years are present (e.g., current and prior), include both as \
         separate columns. Report only the figures prepared on the requested basis and ignore \
         the other set of statements if the report contains both.",
        basis = basis
    )
}

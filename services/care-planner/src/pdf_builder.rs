//! Treatment plan PDF rendering.
//!
//! Layout runs as a pure pass over the plan producing positioned text per
//! page (points, origin bottom-left). Drawing then replays the layout with
//! `printpdf` builtin Helvetica fonts.

use careplan_models::Plan;
use careplan_utils::{CarePlanError, CarePlanResult};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};
use std::io::BufWriter;
use tracing::debug;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;

const MARGIN_X: f32 = 54.0;
const TOP_Y: f32 = 770.0;
const SECTION_BREAK_Y: f32 = 100.0;
const LINE_BREAK_Y: f32 = 80.0;
const FOOTER_Y: f32 = 40.0;
const BULLET_INDENT: f32 = 15.0;
const WRAP_CHARS: usize = 90;

const TITLE: &str = "AI-Generated Treatment Plan";
const SUBTITLE: &str = "This document provides a structured treatment plan based on the clinical diagnosis.";
const FOOTER: &str = "Note: This AI-generated plan is for clinical decision support only and should not replace professional medical judgment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Oblique,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub style: FontStyle,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub items: Vec<PlacedText>,
}

struct LayoutCursor {
    pages: Vec<PageLayout>,
    y: f32,
}

impl LayoutCursor {
    fn new() -> Self {
        Self {
            pages: vec![PageLayout::default()],
            y: TOP_Y,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y = TOP_Y;
    }

    fn place(&mut self, text: &str, x: f32, y: f32, size: f32, style: FontStyle) {
        if let Some(page) = self.pages.last_mut() {
            page.items.push(PlacedText {
                text: pdf_safe(text),
                x,
                y,
                size,
                style,
            });
        }
    }

    fn section(&mut self, heading: &str, lines: &[String]) {
        if self.y < SECTION_BREAK_Y {
            self.new_page();
        }
        self.place(heading, MARGIN_X, self.y, 12.0, FontStyle::Bold);
        self.y -= 20.0;

        for line in lines {
            for (i, wrapped) in wrap_text(line, WRAP_CHARS).into_iter().enumerate() {
                if self.y < LINE_BREAK_Y {
                    self.new_page();
                }
                let text = if i == 0 {
                    format!("- {}", wrapped)
                } else {
                    format!("  {}", wrapped)
                };
                self.place(&text, MARGIN_X + BULLET_INDENT, self.y, 10.0, FontStyle::Regular);
                self.y -= 15.0;
            }
        }
        self.y -= 15.0;
    }
}

/// Position every line of the plan document.
pub fn layout_plan(plan: &Plan) -> Vec<PageLayout> {
    let mut cursor = LayoutCursor::new();

    cursor.place(TITLE, MARGIN_X, cursor.y, 16.0, FontStyle::Bold);
    cursor.y -= 30.0;
    cursor.place(SUBTITLE, MARGIN_X, cursor.y, 10.0, FontStyle::Regular);
    cursor.y -= 40.0;

    for section in &plan.treatment_sections {
        cursor.section(&section.name, &section.steps);
    }

    cursor.section("Estimated Cost", &cost_lines(plan));
    cursor.section("Appointment Recommendation", &appointment_lines(plan));

    if !plan.hospital_options.is_empty() {
        let lines: Vec<String> = plan
            .hospital_options
            .iter()
            .map(|h| format!("{} ({}), OPD fee {}", h.display_name, h.tier, h.opd_fee))
            .collect();
        cursor.section("Hospital Options", &lines);
    }

    cursor.place(FOOTER, MARGIN_X, FOOTER_Y, 8.0, FontStyle::Oblique);
    cursor.pages
}

fn cost_lines(plan: &Plan) -> Vec<String> {
    let cost = &plan.estimated_cost;
    let estimate = &cost.hospital_estimate;
    let mut lines = vec![
        format!("Hospital: {} ({})", estimate.hospital_name, estimate.hospital_type),
        format!("Estimated Treatment Cost: {}", estimate.range),
    ];
    lines.extend(
        cost.items
            .iter()
            .map(|item| format!("{}: {}", title_case(&item.category), item.amount)),
    );
    if !cost.notes.is_empty() {
        lines.push(format!("Notes: {}", cost.notes));
    }
    lines
}

fn appointment_lines(plan: &Plan) -> Vec<String> {
    let appointment = &plan.appointment;
    vec![
        format!("Urgency: {}", appointment.urgency),
        format!("Specialist: {}", appointment.specialist),
        format!("Recommended Timeline: {}", appointment.recommended_timeline),
        format!("Follow-up Frequency: {}", appointment.follow_up_frequency),
    ]
}

/// Render the plan as PDF bytes.
pub fn render_plan_pdf(plan: &Plan) -> CarePlanResult<Vec<u8>> {
    let pages = layout_plan(plan);

    let (doc, first_page, first_layer) =
        PdfDocument::new(TITLE, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| CarePlanError::rendering(format!("PDF font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| CarePlanError::rendering(format!("PDF font error: {e}")))?;
    let oblique = doc
        .add_builtin_font(BuiltinFont::HelveticaOblique)
        .map_err(|e| CarePlanError::rendering(format!("PDF font error: {e}")))?;

    let fonts = Fonts {
        regular,
        bold,
        oblique,
    };

    for (i, page) in pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            doc.get_page(page_index).get_layer(layer_index)
        };
        for item in &page.items {
            layer.use_text(item.text.as_str(), item.size, pt_to_mm(item.x), pt_to_mm(item.y), fonts.get(item.style));
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| CarePlanError::rendering(format!("PDF save error: {e}")))?;
    let bytes = buf
        .into_inner()
        .map_err(|e| CarePlanError::rendering(format!("PDF buffer error: {e}")))?;

    debug!(pages = pages.len(), bytes = bytes.len(), "Plan PDF rendered");
    Ok(bytes)
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl Fonts {
    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Oblique => &self.oblique,
        }
    }
}

fn pt_to_mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

/// Builtin fonts only cover WinAnsi; replace what they cannot show.
fn pdf_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '₹' => out.push_str("Rs."),
            '–' | '—' => out.push('-'),
            '‘' | '’' => out.push('\''),
            '“' | '”' => out.push('"'),
            c if c.is_ascii() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn title_case(category: &str) -> String {
    category
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.chars().count() + word.chars().count() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use careplan_models::HospitalInfo;

    use crate::rules::ClinicalRules;

    fn plan_with_steps(steps: usize) -> Plan {
        let rules = ClinicalRules::new();
        let problem = "Type 2 Diabetes Mellitus";
        let mut sections = rules.treatment_template(problem);
        sections[1].steps = (1..=steps).map(|i| format!("Medication step {}", i)).collect();
        Plan {
            identified_problem: problem.to_string(),
            treatment_sections: sections,
            estimated_cost: rules.estimate_cost(problem, &HospitalInfo::default()),
            appointment: rules.recommend_appointment(problem),
            source: careplan_models::PlanSource::RuleTemplate,
            context_documents: 0,
            hospital_options: Vec::new(),
        }
    }

    fn all_items(pages: &[PageLayout]) -> impl Iterator<Item = &PlacedText> {
        pages.iter().flat_map(|p| p.items.iter())
    }

    #[test]
    fn test_layout_header_and_sections() {
        let pages = layout_plan(&plan_with_steps(3));
        assert_eq!(pages.len(), 1);

        let items = &pages[0].items;
        assert_eq!(items[0].text, TITLE);
        assert_eq!(items[0].style, FontStyle::Bold);
        assert_eq!(items[0].y, TOP_Y);
        assert_eq!(items[1].y, TOP_Y - 30.0);
        assert_eq!(items[2].text, "Immediate Care");
        assert_eq!(items[2].y, TOP_Y - 70.0);
        assert_eq!(items[3].text, "- Assess fasting and postprandial blood glucose levels");
        assert_eq!(items[3].x, MARGIN_X + BULLET_INDENT);
        assert_eq!(items[3].y, TOP_Y - 90.0);

        let texts: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
        assert!(texts.contains(&"Estimated Cost"));
        assert!(texts.contains(&"- Consultation: Rs.800 - Rs.1,500"));
        assert!(texts.contains(&"- Estimated Treatment Cost: Rs.20,000 - Rs.80,000"));
        assert!(texts.contains(&"- Urgency: High"));
    }

    #[test]
    fn test_layout_paginates() {
        let pages = layout_plan(&plan_with_steps(80));
        assert!(pages.len() >= 2);

        for item in all_items(&pages).filter(|i| i.style != FontStyle::Oblique) {
            assert!(item.y <= TOP_Y);
            assert!(item.y >= LINE_BREAK_Y);
        }
        assert!(pages[1..].iter().all(|p| p.items[0].y == TOP_Y));
    }

    #[test]
    fn test_footer_only_on_last_page() {
        let pages = layout_plan(&plan_with_steps(80));
        let footers: Vec<usize> = pages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.items.iter().any(|i| i.style == FontStyle::Oblique))
            .map(|(n, _)| n)
            .collect();
        assert_eq!(footers, vec![pages.len() - 1]);
        let footer = pages.last().unwrap().items.last().unwrap();
        assert_eq!((footer.y, footer.size), (FOOTER_Y, 8.0));
    }

    #[test]
    fn test_long_steps_wrap() {
        let mut plan = plan_with_steps(1);
        plan.treatment_sections[0].steps = vec!["word ".repeat(50)];
        let pages = layout_plan(&plan);
        let texts: Vec<&str> = all_items(&pages).map(|i| i.text.as_str()).collect();
        let start = texts.iter().position(|t| t.starts_with("- word")).unwrap();
        assert!(texts[start + 1].starts_with("  word"));
        assert!(texts.iter().all(|t| t.chars().count() <= WRAP_CHARS + 2 || *t == FOOTER || *t == SUBTITLE));
    }

    #[test]
    fn test_pdf_safe() {
        assert_eq!(pdf_safe("₹1,000 – ₹2,000"), "Rs.1,000 - Rs.2,000");
        assert_eq!(pdf_safe("Café"), "Caf?");
        assert_eq!(title_case("follow_up_cost"), "Follow Up Cost");
    }

    #[test]
    fn test_render_produces_pdf() {
        let plan = plan_with_steps(80);
        let bytes = render_plan_pdf(&plan).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        let document = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(document.get_pages().len(), layout_plan(&plan).len());
    }
}

use regex::Regex;

/// Strip known model boilerplate before structural parsing.
///
/// The vision model wraps its transcription in commentary: a closing
/// "Here's the extracted text..." sentence, bold-markdown headings,
/// markdown table rulings, page footers, and "(Empty)" placeholders
/// for blank cells. Each removal trims surrounding whitespace. The
/// whole pass is idempotent, so re-cleaning cleaned text is a no-op.
pub fn clean_model_text(text: &str) -> String {
    // Everything from the transcription preamble onward is commentary.
    let boilerplate = Regex::new(r"(?is)Here's the extracted text from the receipt.*").unwrap();
    // Bold-markdown segments run to the end of their line.
    let bold = Regex::new(r"\*{2}.*").unwrap();
    let table = Regex::new(r"\|---|\|").unwrap();
    let pages = Regex::new(r"Page \d+ of \d+").unwrap();
    let empty = Regex::new(r"\(Empty\)").unwrap();

    let text = boilerplate.replace_all(text, "");
    let text = bold.replace_all(text.trim(), "");
    let text = table.replace_all(text.trim(), "");
    let text = pages.replace_all(text.trim(), "");
    let text = empty.replace_all(text.trim(), "");
    text.trim().to_string()
}

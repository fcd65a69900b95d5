// src/assistant/mod.rs

//! Rule-based library assistant.
//!
//! Stateless request/response: policy rules first (ordered, first match
//! wins), then structured extraction against live catalog data fetched on
//! demand, then a fixed fallback. A catalog fetch failure degrades to a
//! fixed apology; `respond` never returns an error to the caller.

pub mod rules;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::Regex;
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::models::Book;
use crate::store::{Backend, BookRepository};

const APOLOGY: &str = "Maaf, saya tidak dapat mengambil informasi buku saat ini. Silakan coba lagi nanti.";

const FALLBACK_ID: &str = "Maaf, saya tidak sepenuhnya memahami pertanyaan Anda. Anda dapat bertanya tentang \
                           ketersediaan buku, jam perpustakaan, atau kebijakan peminjaman. Bisakah Anda mengajukan \
                           pertanyaan dengan cara lain?";

const FALLBACK_EN: &str = "I'm not sure I understand your question completely. You can ask me about finding \
                           specific books, checking availability, library hours, or borrowing policies. Could you \
                           rephrase your question?";

/// Fixed facts served by the assistant alongside catalog data.
pub struct LibraryInfo {
  pub name: &'static str,
  pub opening_hours: &'static str,
  pub borrowing_period_days: i64,
  pub max_books_per_user: u32,
  pub late_fee: &'static str,
}

pub const LIBRARY_INFO: LibraryInfo = LibraryInfo {
  name: "Librify",
  opening_hours: "Monday to Friday: 9:00 AM - 8:00 PM, Saturday and Sunday: 10:00 AM - 6:00 PM",
  borrowing_period_days: crate::models::LOAN_PERIOD_DAYS,
  max_books_per_user: 5,
  late_fee: "$0.50 per day",
};

static STOCK_QUERY_ID: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)sto[kc]k?\s+buku\s+([^?.,]+)").expect("valid stock regex")
});
static COUNT_QUERY_ID: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)berapa(?:\s+(?:stok|jumlah))?\s+(?:buku\s+)?([^?.,]+)").expect("valid count regex")
});
static GREETING_ID: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)^(halo|hai|selamat (pagi|siang|sore|malam))[\s!.?]*$").expect("valid greeting regex")
});
static THANKS_ID: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)^(terima kasih|makasih|thanks)[\s!.?]*$").expect("valid thanks regex")
});
static GREETING_EN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)^(hello|hi|hey|greetings|good (morning|afternoon|evening))[\s!.?]*$").expect("valid greeting regex")
});
static THANKS_EN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)^(thank you|thanks( a lot)?|thank|appreciate it)[\s!.?]*$").expect("valid thanks regex")
});
static TITLE_SEARCH_EN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"(?i)(?:find|search|looking for|about|book)\s+(?:called|titled|named)?\s*"?([^"?.,]+)"?"#)
    .expect("valid title regex")
});
static STOCK_QUERY_EN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"(?i)(?:stock|availability)(?:\s+of)?\s+"?([^"?.,]+)"?"#).expect("valid stock regex")
});
static AUTHOR_QUERY_EN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)(?:author\s+(?:named\s+|called\s+)?|books\s+by\s+|written\s+by\s+)([^?.,]+)")
    .expect("valid author regex")
});

pub struct Assistant {
  books: Arc<dyn BookRepository>,
}

impl Assistant {
  pub fn new(backend: &Backend) -> Self {
    Self {
      books: backend.books_handle(),
    }
  }

  #[instrument(name = "assistant::respond", skip_all)]
  pub async fn respond(&self, message: &str) -> String {
    let query = message.trim().to_lowercase();
    if query.is_empty() {
      return FALLBACK_EN.to_string();
    }

    // (a) policy FAQ, no catalog needed
    if let Some(answer) = rules::match_policy(&query) {
      return answer.to_string();
    }

    // (b) structured extraction against live catalog data
    let books = match self.books.find_all().await {
      Ok(books) => books,
      Err(e) => {
        warn!(error = %e, "Assistant could not fetch the catalog");
        return APOLOGY.to_string();
      }
    };
    respond_with_catalog(&query, &books)
  }
}

/// Heuristic, not a classifier: the presence of any common Indonesian
/// library word routes the message to the Indonesian answers.
fn is_indonesian(query: &str) -> bool {
  const MARKERS: &[&str] = &[
    "berapa",
    "stok",
    "buku",
    "perpustakaan",
    "jam buka",
    "pinjam",
    "kembali",
    "denda",
  ];
  MARKERS.iter().any(|marker| query.contains(marker)) || GREETING_ID.is_match(query) || THANKS_ID.is_match(query)
}

fn respond_with_catalog(query: &str, books: &[Book]) -> String {
  if is_indonesian(query) {
    respond_indonesian(query, books)
  } else {
    respond_english(query, books)
  }
}

fn respond_indonesian(query: &str, books: &[Book]) -> String {
  if let Some(caps) = STOCK_QUERY_ID.captures(query) {
    return stock_answer_id(caps[1].trim(), books);
  }

  if GREETING_ID.is_match(query) {
    return "Halo! Bagaimana saya bisa membantu Anda dengan perpustakaan hari ini?".to_string();
  }
  if THANKS_ID.is_match(query) {
    return "Sama-sama! Beri tahu saya jika Anda membutuhkan bantuan lain.".to_string();
  }

  if query.contains("jam") {
    return format!("Perpustakaan buka pada {}.", LIBRARY_INFO.opening_hours);
  }
  if query.contains("pinjam") && !query.contains("buku ") {
    return format!(
      "Anda dapat meminjam buku selama {} hari. Jumlah maksimum buku yang dapat Anda pinjam sekaligus adalah {}.",
      LIBRARY_INFO.borrowing_period_days, LIBRARY_INFO.max_books_per_user
    );
  }
  if query.contains("denda") || query.contains("terlambat") {
    return format!("Denda keterlambatan pengembalian adalah {}.", LIBRARY_INFO.late_fee);
  }

  if let Some(caps) = COUNT_QUERY_ID.captures(query) {
    let answer = stock_answer_id(caps[1].trim(), books);
    if !answer.starts_with("Buku dengan judul") {
      return answer;
    }
    // A "berapa buku ..." question with no matching title falls through to
    // the general availability answer below.
  }

  if query.contains("berapa") || query.contains("stok") || query.contains("buku") {
    return availability_answer_id(books);
  }

  FALLBACK_ID.to_string()
}

fn respond_english(query: &str, books: &[Book]) -> String {
  if GREETING_EN.is_match(query) {
    return "Hello! How can I help you with the library today?".to_string();
  }
  if THANKS_EN.is_match(query) {
    return "You're welcome! Let me know if you need anything else.".to_string();
  }

  if query.contains("category") || query.contains("categories") || query.contains("genre") || query.contains("genres")
  {
    return categories_answer(books);
  }

  if let Some(caps) = AUTHOR_QUERY_EN.captures(query) {
    return author_answer(caps[1].trim(), books);
  }

  if query.contains("recommend") || query.contains("suggestion") || query.contains("popular") {
    return recommendation_answer(books);
  }

  if query.contains("stock") || query.contains("available") {
    if let Some(caps) = STOCK_QUERY_EN.captures(query) {
      let needle = caps[1].trim();
      if needle != "books" && !needle.is_empty() {
        return stock_answer_en(needle, books);
      }
    }
    return availability_answer_en(books);
  }

  if (query.contains("find") || query.contains("search") || query.contains("looking for") || query.contains("book"))
    && !query.contains("borrow")
  {
    if let Some(caps) = TITLE_SEARCH_EN.captures(query) {
      let needle = caps[1].trim();
      if !needle.is_empty() {
        return title_search_answer(needle, books);
      }
    }
  }

  if query.contains("hour") || query.contains("open") || query.contains("close") || query.contains("timing") {
    return format!("The library is open {}.", LIBRARY_INFO.opening_hours);
  }
  if query.contains("borrow") || query.contains("loan") || query.contains("take out") {
    return format!(
      "You can borrow books for {} days. The maximum number of books you can borrow at once is {}.",
      LIBRARY_INFO.borrowing_period_days, LIBRARY_INFO.max_books_per_user
    );
  }
  if query.contains("fee") || query.contains("fine") || query.contains("late") || query.contains("overdue") {
    return format!("The late return fee is {}.", LIBRARY_INFO.late_fee);
  }
  if query.contains("library") {
    return format!(
      "{} is open {}. You can borrow up to {} books for {} days, with a late fee of {}.",
      LIBRARY_INFO.name,
      LIBRARY_INFO.opening_hours,
      LIBRARY_INFO.max_books_per_user,
      LIBRARY_INFO.borrowing_period_days,
      LIBRARY_INFO.late_fee
    );
  }

  if query.contains("help") || query.contains("what can you do") || query.contains("how to use") {
    return "I can help you with several library-related tasks:\n\n\
            \u{2022} Find books by title, author, or category\n\
            \u{2022} Check book availability\n\
            \u{2022} Provide book recommendations\n\
            \u{2022} Share information about borrowing policies\n\
            \u{2022} Tell you about library hours\n\
            \u{2022} Answer questions about late fees and returns\n\n\
            What can I help you with today?"
      .to_string();
  }

  FALLBACK_EN.to_string()
}

fn matching_titles<'a>(needle: &str, books: &'a [Book]) -> Vec<&'a Book> {
  let needle = needle.to_lowercase();
  books
    .iter()
    .filter(|book| book.title.to_lowercase().contains(&needle))
    .collect()
}

fn stock_answer_id(needle: &str, books: &[Book]) -> String {
  let found = matching_titles(needle, books);
  match found.as_slice() {
    [book] => format!("Stok buku \"{}\" oleh {}: {}", book.title, book.author, book.stock),
    [] => format!("Buku dengan judul mengandung \"{}\" tidak ditemukan.", needle),
    many => {
      let titles = many
        .iter()
        .map(|book| format!("\"{}\"", book.title))
        .collect::<Vec<_>>()
        .join(", ");
      format!("Ada beberapa buku yang mirip: {}. Mohon spesifikkan judulnya.", titles)
    }
  }
}

fn stock_answer_en(needle: &str, books: &[Book]) -> String {
  match matching_titles(needle, books).first() {
    Some(book) => {
      let unit = if book.stock == 1 { "copy" } else { "copies" };
      format!(
        "\"{}\" by {} has {} {} available in stock.",
        book.title, book.author, book.stock, unit
      )
    }
    None => format!("I couldn't find any book titled \"{}\" in our collection.", needle),
  }
}

fn title_search_answer(needle: &str, books: &[Book]) -> String {
  let lowered = needle.to_lowercase();
  let matches: Vec<&Book> = books
    .iter()
    .filter(|book| book.title.to_lowercase().contains(&lowered) || book.author.to_lowercase().contains(&lowered))
    .collect();

  match matches.as_slice() {
    [] => FALLBACK_EN.to_string(),
    [book] => format!(
      "I found \"{}\" by {}. {} There are currently {} copies available.",
      book.title,
      book.author,
      book.description.as_deref().unwrap_or("No description available."),
      book.stock
    ),
    many => {
      let listed = many
        .iter()
        .take(3)
        .map(|book| format!("\"{}\" by {}", book.title, book.author))
        .collect::<Vec<_>>()
        .join(", ");
      let more = if many.len() > 3 {
        format!(" and {} more", many.len() - 3)
      } else {
        String::new()
      };
      format!(
        "I found {} books that might match your query: {}{}. Would you like more information about any of these books?",
        many.len(),
        listed,
        more
      )
    }
  }
}

fn available_sorted(books: &[Book]) -> Vec<&Book> {
  let mut available: Vec<&Book> = books.iter().filter(|book| book.is_available()).collect();
  available.sort_by(|a, b| b.stock.cmp(&a.stock));
  available
}

fn availability_answer_id(books: &[Book]) -> String {
  let available = available_sorted(books);
  let listed = available
    .iter()
    .take(3)
    .map(|book| format!("\"{}\" oleh {} (stok {})", book.title, book.author, book.stock))
    .collect::<Vec<_>>()
    .join(", ");
  format!(
    "Ada {} buku yang tersedia untuk dipinjam. Beberapa pilihan: {}.",
    available.len(),
    listed
  )
}

fn availability_answer_en(books: &[Book]) -> String {
  let available = available_sorted(books);
  let listed = available
    .iter()
    .take(3)
    .map(|book| format!("\"{}\" by {} ({} in stock)", book.title, book.author, book.stock))
    .collect::<Vec<_>>()
    .join(", ");
  format!(
    "We have {} books currently available for borrowing. Some options include: {}. Is there a specific genre or author you're interested in?",
    available.len(),
    listed
  )
}

fn categories_answer(books: &[Book]) -> String {
  let mut categories: Vec<&str> = books.iter().map(|book| book.category.as_str()).collect();
  categories.sort_unstable();
  categories.dedup();
  format!(
    "Our library has books in the following categories: {}. Would you like recommendations from any specific category?",
    categories.join(", ")
  )
}

fn author_answer(needle: &str, books: &[Book]) -> String {
  let lowered = needle.to_lowercase();
  let by_author: Vec<&Book> = books
    .iter()
    .filter(|book| book.author.to_lowercase().contains(&lowered))
    .collect();

  if by_author.is_empty() {
    return format!("I couldn't find any books by an author named \"{}\" in our collection.", needle);
  }
  let listed = by_author
    .iter()
    .map(|book| format!("\"{}\" ({} in stock)", book.title, book.stock))
    .collect::<Vec<_>>()
    .join(", ");
  format!("I found {} books by {}: {}.", by_author.len(), needle, listed)
}

fn recommendation_answer(books: &[Book]) -> String {
  let available: Vec<&Book> = books.iter().filter(|book| book.is_available()).collect();
  let picks = available
    .choose_multiple(&mut rand::thread_rng(), 3)
    .map(|book| format!("\"{}\" by {} ({})", book.title, book.author, book.category))
    .collect::<Vec<_>>()
    .join(", ");
  format!(
    "Here are some book recommendations: {}. Would you like more suggestions or information about any of these books?",
    picks
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::memory::sample_books;

  #[test]
  fn indonesian_stock_query_names_the_book() {
    let books = sample_books();
    let answer = respond_with_catalog("stok buku ikigai", &books);
    assert_eq!(answer, "Stok buku \"Ikigai\" oleh Héctor García and Francesc Miralles: 6");
  }

  #[test]
  fn english_stock_query_reports_copies() {
    let books = sample_books();
    let answer = respond_with_catalog("what is the stock of \"deep work\"", &books);
    assert!(answer.contains("\"Deep Work\" by Cal Newport has 2 copies"));
  }

  #[test]
  fn unknown_title_is_reported() {
    let books = sample_books();
    let answer = respond_with_catalog("stok buku naruto", &books);
    assert_eq!(answer, "Buku dengan judul mengandung \"naruto\" tidak ditemukan.");
  }

  #[test]
  fn author_query_lists_all_titles() {
    let books = sample_books();
    let answer = respond_with_catalog("books by james clear", &books);
    assert!(answer.contains("Atomic Habits"));
  }

  #[test]
  fn greeting_is_answered_in_kind() {
    let books = sample_books();
    assert!(respond_with_catalog("halo", &books).starts_with("Halo!"));
    assert!(respond_with_catalog("hello", &books).starts_with("Hello!"));
  }

  #[test]
  fn late_fee_questions_quote_the_policy() {
    let books = sample_books();
    let answer = respond_with_catalog("berapa denda kalau terlambat", &books);
    assert!(answer.contains("$0.50 per day"));
  }

  #[test]
  fn gibberish_falls_back() {
    let books = sample_books();
    assert_eq!(respond_with_catalog("xyzzy plugh", &books), FALLBACK_EN);
  }

  #[test]
  fn category_listing_is_deduplicated() {
    let books = sample_books();
    let answer = respond_with_catalog("which categories do you have", &books);
    let productivity_mentions = answer.matches("Productivity").count();
    assert_eq!(productivity_mentions, 1);
  }
}

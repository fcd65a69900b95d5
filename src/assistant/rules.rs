// src/assistant/rules.rs

//! Library policy FAQ as an ordered rule table. Evaluation is first-match
//! wins, so broader rules must come after the specific ones they overlap.

pub struct PolicyRule {
  pub keywords: &'static [&'static str],
  pub answer: &'static str,
}

pub const POLICY_RULES: &[PolicyRule] = &[
  PolicyRule {
    keywords: &["makanan", "makan", "bawa makanan", "boleh makan"],
    answer: "Tidak, Anda tidak diperbolehkan membawa atau mengonsumsi makanan di dalam perpustakaan demi menjaga kebersihan dan kenyamanan bersama.",
  },
  PolicyRule {
    keywords: &["hewan", "bawa hewan", "binatang", "boleh bawa hewan"],
    answer: "Tidak, membawa hewan ke dalam perpustakaan tidak diperbolehkan kecuali hewan penuntun untuk kebutuhan khusus.",
  },
  PolicyRule {
    keywords: &["berisik", "suara", "ribut", "bercakap keras", "boleh berisik"],
    answer: "Tidak, pengunjung tidak diperbolehkan berisik di dalam perpustakaan. Harap menjaga ketenangan agar semua pengunjung dapat belajar dan membaca dengan nyaman.",
  },
  PolicyRule {
    keywords: &["cara pinjam", "aturan pinjam", "prosedur pinjam", "prosedur peminjaman"],
    answer: "Peminjaman buku dilakukan dengan menunjukkan kartu anggota. Buku harus dikembalikan tepat waktu dan dalam kondisi baik (tidak rusak atau hilang). Jika terlambat atau rusak, akan dikenakan denda sesuai kebijakan perpustakaan.",
  },
  PolicyRule {
    keywords: &["kebersihan", "sampah", "buang sampah"],
    answer: "Pengunjung wajib menjaga kebersihan perpustakaan dan membuang sampah pada tempatnya.",
  },
  PolicyRule {
    keywords: &["merokok", "rokok", "asap rokok"],
    answer: "Dilarang merokok di seluruh area perpustakaan.",
  },
  PolicyRule {
    keywords: &["aturan", "peraturan", "tata tertib", "rule", "rules", "regulation"],
    answer: "Beberapa aturan utama perpustakaan: tidak boleh membawa makanan/minuman, tidak boleh membawa hewan, tidak boleh berisik, wajib menjaga kebersihan, dan harus mengembalikan buku tepat waktu. Untuk detail lebih lanjut, silakan tanyakan aturan spesifik yang ingin Anda ketahui.",
  },
  PolicyRule {
    keywords: &["kerusakan", "buku rusak", "buku hilang"],
    answer: "Buku yang dipinjam harus dijaga dengan baik. Jika buku rusak atau hilang, peminjam wajib mengganti atau membayar sesuai ketentuan perpustakaan.",
  },
];

/// First policy rule whose keyword occurs in the (lowercased) message.
pub fn match_policy(query: &str) -> Option<&'static str> {
  for rule in POLICY_RULES {
    if rule.keywords.iter().any(|keyword| query.contains(keyword)) {
      return Some(rule.answer);
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn first_matching_rule_wins() {
    // "makanan" appears in the first rule even though "aturan" is also present.
    let answer = match_policy("apa aturan membawa makanan?").unwrap();
    assert!(answer.contains("makanan"));
  }

  #[test]
  fn unmatched_query_returns_none() {
    assert!(match_policy("stok buku ikigai").is_none());
  }
}

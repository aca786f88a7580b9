//! Porter suffix-stripping stemmer, NLTK-extensions variant.
//!
//! Output must match the stemmer the classifier vocabulary was built with
//! character for character, so the rule tables below follow that variant
//! exactly, including its departures from the 1980 paper:
//!
//! - a table of irregular forms (`skies` → `sky`, `dying` → `die`, ...)
//! - words of one or two letters are returned unchanged
//! - step 1a/1b: four-letter `-ies`/`-ied` words keep their `e` (`dies` → `die`)
//! - step 1c: `y` → `i` only after a consonant that is not the first letter
//! - step 2: `alli` is reduced first and re-run; `fulli` and `logi` rules added
//! - `*o` also matches a two-letter vowel–consonant stem
//!
//! Input is expected to be lowercase ASCII; anything else is returned
//! lowercased but otherwise untouched.

/// `(suffix, replacement, condition on the stem left after stripping)`.
type Rule<'a> = (&'static str, &'static str, &'a dyn Fn(&str) -> bool);

#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

impl PorterStemmer {
  pub fn new() -> Self { Self }

  pub fn stem(&self, word: &str) -> String {
    let word = word.to_lowercase();

    if let Some(base) = irregular_form(&word) {
      return base.to_owned();
    }
    if word.len() <= 2 || !word.is_ascii() {
      return word;
    }

    let word = step1a(&word);
    let word = step1b(&word);
    let word = step1c(&word);
    let word = step2(&word);
    let word = step3(&word);
    let word = step4(&word);
    let word = step5a(&word);
    step5b(&word)
  }
}

fn irregular_form(word: &str) -> Option<&'static str> {
  let base = match word {
    "sky" | "skies" => "sky",
    "dying" => "die",
    "lying" => "lie",
    "tying" => "tie",
    "news" => "news",
    "innings" | "inning" => "inning",
    "outings" | "outing" => "outing",
    "cannings" | "canning" => "canning",
    "howe" => "howe",
    "proceed" => "proceed",
    "exceed" => "exceed",
    "succeed" => "succeed",
    _ => return None,
  };
  Some(base)
}

// ─── Letter classes ──────────────────────────────────────────────────────────

fn is_consonant(word: &[u8], i: usize) -> bool {
  match word[i] {
    b'a' | b'e' | b'i' | b'o' | b'u' => false,
    b'y' => i == 0 || !is_consonant(word, i - 1),
    _ => true,
  }
}

/// Porter's *m*: the number of vowel→consonant transitions in `stem`.
fn measure(stem: &str) -> usize {
  let bytes = stem.as_bytes();
  let mut count = 0;
  let mut prev_vowel = false;
  for i in 0..bytes.len() {
    let consonant = is_consonant(bytes, i);
    if consonant && prev_vowel {
      count += 1;
    }
    prev_vowel = !consonant;
  }
  count
}

fn has_positive_measure(stem: &str) -> bool { measure(stem) > 0 }

fn contains_vowel(stem: &str) -> bool {
  let bytes = stem.as_bytes();
  (0..bytes.len()).any(|i| !is_consonant(bytes, i))
}

/// `*d`: ends with a doubled consonant.
fn ends_double_consonant(word: &str) -> bool {
  let b = word.as_bytes();
  let n = b.len();
  n >= 2 && b[n - 1] == b[n - 2] && is_consonant(b, n - 1)
}

/// `*o`: ends consonant–vowel–consonant, the last not `w`, `x` or `y`; or is
/// a two-letter vowel–consonant word.
fn ends_cvc(word: &str) -> bool {
  let b = word.as_bytes();
  let n = b.len();
  let classic = n >= 3
    && is_consonant(b, n - 3)
    && !is_consonant(b, n - 2)
    && is_consonant(b, n - 1)
    && !matches!(b[n - 1], b'w' | b'x' | b'y');
  classic || (n == 2 && !is_consonant(b, 0) && is_consonant(b, 1))
}

// ─── Rule application ────────────────────────────────────────────────────────

/// Apply the first rule whose suffix matches. A matching rule whose condition
/// fails ends the search with the word unchanged.
fn apply_rules(word: &str, rules: &[Rule<'_>]) -> String {
  for (suffix, replacement, condition) in rules {
    if let Some(stem) = word.strip_suffix(suffix) {
      return if condition(stem) {
        format!("{stem}{replacement}")
      } else {
        word.to_owned()
      };
    }
  }
  word.to_owned()
}

fn always(_: &str) -> bool { true }

fn measure_gt_1(stem: &str) -> bool { measure(stem) > 1 }

// ─── Steps ───────────────────────────────────────────────────────────────────

fn step1a(word: &str) -> String {
  if word.len() == 4
    && let Some(stem) = word.strip_suffix("ies")
  {
    return format!("{stem}ie");
  }
  apply_rules(word, &[
    ("sses", "ss", &always),
    ("ies", "i", &always),
    ("ss", "ss", &always),
    ("s", "", &always),
  ])
}

fn step1b(word: &str) -> String {
  if let Some(stem) = word.strip_suffix("ied") {
    return if word.len() == 4 { format!("{stem}ie") } else { format!("{stem}i") };
  }

  if let Some(stem) = word.strip_suffix("eed") {
    return if has_positive_measure(stem) { format!("{stem}ee") } else { word.to_owned() };
  }

  let Some(stem) = ["ed", "ing"]
    .iter()
    .find_map(|suffix| word.strip_suffix(suffix).filter(|s| contains_vowel(s)))
  else {
    return word.to_owned();
  };

  for (suffix, replacement) in [("at", "ate"), ("bl", "ble"), ("iz", "ize")] {
    if let Some(base) = stem.strip_suffix(suffix) {
      return format!("{base}{replacement}");
    }
  }

  if ends_double_consonant(stem) {
    let last = stem.as_bytes()[stem.len() - 1];
    return if matches!(last, b'l' | b's' | b'z') {
      stem.to_owned()
    } else {
      stem[..stem.len() - 1].to_owned()
    };
  }

  if measure(stem) == 1 && ends_cvc(stem) {
    return format!("{stem}e");
  }
  stem.to_owned()
}

fn step1c(word: &str) -> String {
  let after_consonant = |stem: &str| {
    stem.len() > 1 && is_consonant(stem.as_bytes(), stem.len() - 1)
  };
  apply_rules(word, &[("y", "i", &after_consonant)])
}

fn step2(word: &str) -> String {
  if let Some(stem) = word.strip_suffix("alli")
    && has_positive_measure(stem)
  {
    return step2(&format!("{stem}al"));
  }

  // The `l` of `logi` stays with the stem when measuring.
  let logi = |_: &str| has_positive_measure(&word[..word.len() - 3]);

  apply_rules(word, &[
    ("ational", "ate", &has_positive_measure),
    ("tional", "tion", &has_positive_measure),
    ("enci", "ence", &has_positive_measure),
    ("anci", "ance", &has_positive_measure),
    ("izer", "ize", &has_positive_measure),
    ("bli", "ble", &has_positive_measure),
    ("alli", "al", &has_positive_measure),
    ("entli", "ent", &has_positive_measure),
    ("eli", "e", &has_positive_measure),
    ("ousli", "ous", &has_positive_measure),
    ("ization", "ize", &has_positive_measure),
    ("ation", "ate", &has_positive_measure),
    ("ator", "ate", &has_positive_measure),
    ("alism", "al", &has_positive_measure),
    ("iveness", "ive", &has_positive_measure),
    ("fulness", "ful", &has_positive_measure),
    ("ousness", "ous", &has_positive_measure),
    ("aliti", "al", &has_positive_measure),
    ("iviti", "ive", &has_positive_measure),
    ("biliti", "ble", &has_positive_measure),
    ("fulli", "ful", &has_positive_measure),
    ("logi", "log", &logi),
  ])
}

fn step3(word: &str) -> String {
  apply_rules(word, &[
    ("icate", "ic", &has_positive_measure),
    ("ative", "", &has_positive_measure),
    ("alize", "al", &has_positive_measure),
    ("iciti", "ic", &has_positive_measure),
    ("ical", "ic", &has_positive_measure),
    ("ful", "", &has_positive_measure),
    ("ness", "", &has_positive_measure),
  ])
}

fn step4(word: &str) -> String {
  let ion = |stem: &str| measure(stem) > 1 && (stem.ends_with('s') || stem.ends_with('t'));
  apply_rules(word, &[
    ("al", "", &measure_gt_1),
    ("ance", "", &measure_gt_1),
    ("ence", "", &measure_gt_1),
    ("er", "", &measure_gt_1),
    ("ic", "", &measure_gt_1),
    ("able", "", &measure_gt_1),
    ("ible", "", &measure_gt_1),
    ("ant", "", &measure_gt_1),
    ("ement", "", &measure_gt_1),
    ("ment", "", &measure_gt_1),
    ("ent", "", &measure_gt_1),
    ("ion", "", &ion),
    ("ou", "", &measure_gt_1),
    ("ism", "", &measure_gt_1),
    ("ate", "", &measure_gt_1),
    ("iti", "", &measure_gt_1),
    ("ous", "", &measure_gt_1),
    ("ive", "", &measure_gt_1),
    ("ize", "", &measure_gt_1),
  ])
}

fn step5a(word: &str) -> String {
  if let Some(stem) = word.strip_suffix('e') {
    let m = measure(stem);
    if m > 1 || (m == 1 && !ends_cvc(stem)) {
      return stem.to_owned();
    }
  }
  word.to_owned()
}

fn step5b(word: &str) -> String {
  let whole = |_: &str| measure(&word[..word.len() - 1]) > 1;
  apply_rules(word, &[("ll", "l", &whole)])
}

//! Line-oriented terminal presentation.

use std::io::{self, BufRead, StdinLock, Stdout, Write};

use exercise_core::{
    AttemptResult, DiffKind, ErrorReport, ExerciseKind, Outcome, Presentation, PresentedExercise, Response,
    SessionSummary, WordCategory,
};
use tracing::warn;

/// Inputs that end the session early.
const QUIT_WORDS: [&str; 3] = [":q", "salir", "quit"];

/// Separates the wrong fragment from its correction in find-error answers.
const CORRECTION_ARROW: &str = "=>";

pub struct TerminalPresenter<R, W> {
    input: R,
    output: W,
}

impl TerminalPresenter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPresenter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn render_exercise(&mut self, exercise: &PresentedExercise) -> io::Result<()> {
        let out = &mut self.output;
        writeln!(out)?;
        writeln!(out, "[{} · {}]", exercise.tier, kind_label(exercise.kind))?;
        if let Some(context) = &exercise.context {
            writeln!(out)?;
            for line in context.lines() {
                writeln!(out, "  {line}")?;
            }
        }
        writeln!(out)?;
        writeln!(out, "{}", exercise.prompt)?;
        for (i, option) in exercise.options.iter().enumerate() {
            writeln!(out, "  {}) {option}", i + 1)?;
        }
        for (i, item) in exercise.items.iter().enumerate() {
            writeln!(out, "  [{}] {item}", i + 1)?;
        }
        writeln!(out, "{}", hint(exercise))?;
        out.flush()
    }

    /// Next non-empty line, or `None` at end of input.
    fn read_answer(&mut self) -> io::Result<Option<String>> {
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let line = line.trim();
            if !line.is_empty() {
                return Ok(Some(line.to_string()));
            }
        }
    }

    fn render_result(&mut self, result: &AttemptResult) -> io::Result<()> {
        let out = &mut self.output;
        let verdict = match result.outcome {
            Outcome::Correct => "¡Correcto!",
            Outcome::Partial => "Casi.",
            Outcome::Incorrect => "Incorrecto.",
            Outcome::Malformed => "No entendí la respuesta; inténtalo de nuevo.",
        };
        if result.outcome == Outcome::Malformed {
            writeln!(out, "{verdict}")?;
            return out.flush();
        }
        writeln!(out, "{verdict} ({:.0}%)", result.correctness * 100.0)?;
        for criterion in result.feedback.iter().filter(|c| !c.note.is_empty()) {
            let mark = if criterion.passed { "✓" } else { "✗" };
            writeln!(out, "  {mark} {}", criterion.note)?;
        }
        if result.diff.iter().any(|s| s.kind != DiffKind::Same) {
            let rendered: Vec<String> = result
                .diff
                .iter()
                .map(|s| match s.kind {
                    DiffKind::Same => s.text.clone(),
                    DiffKind::Missing => format!("[+{}]", s.text),
                    DiffKind::Extra => format!("[-{}]", s.text),
                })
                .collect();
            writeln!(out, "  {}", rendered.join(" "))?;
        }
        out.flush()
    }

    pub fn show_summary(&mut self, summary: &SessionSummary) {
        if let Err(e) = self.render_summary(summary) {
            warn!(error = %e, "failed to write summary");
        }
    }

    fn render_summary(&mut self, summary: &SessionSummary) -> io::Result<()> {
        let out = &mut self.output;
        writeln!(out)?;
        writeln!(
            out,
            "Sesión terminada: {}/{} correctas, media {:.0}%",
            summary.correct,
            summary.attempts,
            summary.mean_correctness * 100.0
        )?;
        if summary.start_tier != summary.final_tier {
            writeln!(out, "Nivel: {} → {}", summary.start_tier, summary.final_tier)?;
        } else {
            writeln!(out, "Nivel: {}", summary.final_tier)?;
        }
        for (skill, mastery) in &summary.mastery {
            writeln!(out, "  {:<13} {:>3.0}%", skill.as_str(), mastery * 100.0)?;
        }
        out.flush()
    }
}

impl<R: BufRead, W: Write> Presentation for TerminalPresenter<R, W> {
    fn present(&mut self, exercise: &PresentedExercise) -> Option<Response> {
        if let Err(e) = self.render_exercise(exercise) {
            warn!(error = %e, "failed to write exercise");
            return None;
        }
        let line = match self.read_answer() {
            Ok(Some(line)) => line,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "failed to read answer");
                return None;
            }
        };
        if QUIT_WORDS.iter().any(|q| line.eq_ignore_ascii_case(q)) {
            return None;
        }
        Some(parse_answer(exercise, &line))
    }

    fn show_result(&mut self, result: &AttemptResult) {
        if let Err(e) = self.render_result(result) {
            warn!(error = %e, "failed to write result");
        }
    }

    fn show_error(&mut self, error: &ErrorReport) {
        if writeln!(self.output, "Error ({}): {}", error.kind, error.message).is_err() {
            warn!(%error, "failed to write error");
        }
    }
}

fn kind_label(kind: ExerciseKind) -> &'static str {
    match kind {
        ExerciseKind::ClassifyWord => "clasificar palabra",
        ExerciseKind::Comprehension => "comprensión",
        ExerciseKind::FindError => "encontrar el error",
        ExerciseKind::OrderSentence => "ordenar la oración",
    }
}

fn hint(exercise: &PresentedExercise) -> &'static str {
    match exercise.kind {
        ExerciseKind::OrderSentence => "(escribe los números en orden, p. ej. 2 1 3)",
        ExerciseKind::FindError if exercise.options.is_empty() => {
            "(escribe el fragmento incorrecto, o «fragmento => corrección»)"
        }
        ExerciseKind::FindError => "(elige un número, o escribe «fragmento => corrección»)",
        _ if exercise.options.is_empty() => "(escribe tu respuesta)",
        _ => "(elige un número o escribe tu respuesta)",
    }
}

/// 1-based option pick, if `line` is one.
fn pick_option<'a>(exercise: &'a PresentedExercise, line: &str) -> Option<&'a str> {
    let n: usize = line.parse().ok()?;
    exercise.options.get(n.checked_sub(1)?).map(String::as_str)
}

/// Turn a typed line into a response of the shape the exercise expects.
/// Lines that cannot be read that way are passed through as text, which the
/// validator reports as malformed.
pub fn parse_answer(exercise: &PresentedExercise, line: &str) -> Response {
    let line = line.trim();
    match exercise.kind {
        ExerciseKind::ClassifyWord => {
            let label = pick_option(exercise, line).unwrap_or(line);
            match WordCategory::from_label(label) {
                Some(category) => Response::Category { category },
                None => Response::text(label),
            }
        }
        ExerciseKind::Comprehension => Response::text(pick_option(exercise, line).unwrap_or(line)),
        ExerciseKind::FindError => {
            if let Some((fragment, correction)) = line.split_once(CORRECTION_ARROW) {
                let correction = correction.trim();
                return Response::Defect {
                    fragment: fragment.trim().to_string(),
                    correction: (!correction.is_empty()).then(|| correction.to_string()),
                };
            }
            Response::Defect {
                fragment: pick_option(exercise, line).unwrap_or(line).to_string(),
                correction: None,
            }
        }
        ExerciseKind::OrderSentence => match order_units(exercise, line) {
            Some(units) => Response::Order { units },
            None => Response::text(line),
        },
    }
}

fn order_units(exercise: &PresentedExercise, line: &str) -> Option<Vec<String>> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let n: usize = part.parse().ok()?;
            exercise.items.get(n.checked_sub(1)?).cloned()
        })
        .collect()
}

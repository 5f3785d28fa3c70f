use std::error::Error;
use std::io::{BufRead, Write};
use std::path::Path;

use services::{
    AreaSummary, OverallStats, ProgressTracker, QuizEngine, QuizReport, parse_questions,
};
use tutor_core::model::{Difficulty, Question};

use crate::cli::Command;

type CommandResult = Result<(), Box<dyn Error>>;

/// Run one subcommand against `tracker`, reading quiz answers from `input`.
pub async fn execute(
    command: Command,
    tracker: &mut ProgressTracker,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> CommandResult {
    match command {
        Command::Help => Ok(()),
        Command::Stats => write_stats(out, &tracker.overall_stats()),
        Command::Summary => write_summary(out, tracker),
        Command::Weak { count } => write_areas(out, "Weak areas", &tracker.weak_areas(count)),
        Command::Strong { count } => {
            write_areas(out, "Strong areas", &tracker.strong_areas(count))
        }
        Command::Quiz {
            file,
            subject,
            topic,
            difficulty,
        } => {
            let questions = load_questions(&file)?;
            let mut engine = QuizEngine::new();
            engine.start(&subject, &topic, difficulty, questions)?;
            run_quiz(&mut engine, tracker, input, out).await
        }
        Command::Review { file, difficulty } => {
            let questions = load_questions(&file)?;
            start_review_and_run(tracker, difficulty, questions, input, out).await
        }
        Command::Record {
            subject,
            topic,
            was_correct,
        } => {
            let update = tracker
                .update_mastery(&subject, &topic, was_correct)
                .await?;
            writeln!(
                out,
                "{subject} / {topic}: {:.1}% -> {:.1}% ({})",
                update.previous_mastery * 100.0,
                update.new_mastery * 100.0,
                update.level
            )?;
            for id in &update.newly_earned {
                writeln!(out, "Achievement unlocked: {}", id.name())?;
            }
            if !update.persisted {
                writeln!(out, "warning: progress could not be saved")?;
            }
            Ok(())
        }
        Command::Reset => {
            let persisted = tracker.reset_progress().await;
            writeln!(out, "Progress reset for `{}`.", tracker.storage_key())?;
            if !persisted {
                writeln!(out, "warning: progress could not be saved")?;
            }
            Ok(())
        }
    }
}

fn load_questions(file: &Path) -> Result<Vec<Question>, Box<dyn Error>> {
    let raw = std::fs::read_to_string(file)?;
    Ok(parse_questions(&raw)?)
}

async fn start_review_and_run(
    tracker: &mut ProgressTracker,
    difficulty: Difficulty,
    questions: Vec<Question>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> CommandResult {
    let mut engine = QuizEngine::new();
    let key = engine.start_review(tracker, difficulty, questions)?;
    writeln!(out, "Reviewing {} / {}", key.subject(), key.topic())?;
    run_quiz(&mut engine, tracker, input, out).await
}

/// Ask every question, one answer line each, then print the report.
///
/// Stops early at end of input; a quiz with no answers prints nothing more.
async fn run_quiz(
    engine: &mut QuizEngine,
    tracker: &mut ProgressTracker,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> CommandResult {
    let mut line = String::new();
    loop {
        let Some(current) = engine.current_question() else {
            break;
        };
        writeln!(
            out,
            "\nQuestion {}/{}: {}",
            current.index + 1,
            current.total,
            current.question.text()
        )?;
        for option in current.question.options() {
            writeln!(out, "  {option}")?;
        }
        write!(out, "> ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        let feedback = engine.submit_answer(tracker, line.trim()).await?;
        if feedback.is_correct {
            writeln!(out, "Correct!")?;
        } else {
            writeln!(out, "Incorrect. The answer was {}.", feedback.correct_answer)?;
        }
        if !feedback.explanation.is_empty() {
            writeln!(out, "{}", feedback.explanation)?;
        }
        for id in &feedback.mastery.newly_earned {
            writeln!(out, "Achievement unlocked: {}", id.name())?;
        }
    }

    if engine.progress().is_some_and(|p| p.answered == 0) {
        writeln!(out, "No answers given.")?;
        engine.reset();
        return Ok(());
    }

    let report = engine.results(tracker).await?;
    write_report(out, &report)
}

fn write_report(out: &mut impl Write, report: &QuizReport) -> CommandResult {
    writeln!(out, "\n{} / {} ({})", report.subject, report.topic, report.difficulty)?;
    writeln!(
        out,
        "Score: {}/{} ({:.1}%)  Grade: {}",
        report.score, report.total, report.percentage, report.grade
    )?;
    writeln!(out, "{}", report.message)?;
    writeln!(out, "Time: {}", report.duration)?;
    if !report.persisted {
        writeln!(out, "warning: quiz result could not be saved")?;
    }
    Ok(())
}

fn write_stats(out: &mut impl Write, stats: &OverallStats) -> CommandResult {
    writeln!(out, "Interactions:  {}", stats.total_interactions)?;
    writeln!(out, "Correct:       {}", stats.total_correct)?;
    writeln!(out, "Accuracy:      {}%", stats.accuracy_label())?;
    writeln!(
        out,
        "Mastery:       {:.1}% ({})",
        stats.average_mastery * 100.0,
        stats.mastery_level
    )?;
    writeln!(out, "Subjects:      {}", stats.subjects_studied)?;
    writeln!(out, "Topics:        {}", stats.topics_studied)?;
    writeln!(out, "Quizzes:       {}", stats.quizzes_taken)?;
    writeln!(out, "Achievements:  {}", stats.achievements_earned)?;
    Ok(())
}

fn write_areas(out: &mut impl Write, title: &str, areas: &[AreaSummary]) -> CommandResult {
    writeln!(out, "{title}:")?;
    if areas.is_empty() {
        writeln!(out, "  (none yet)")?;
    }
    for area in areas {
        writeln!(
            out,
            "  {} / {}: {:.1}% ({}, {} attempts)",
            area.subject,
            area.topic,
            area.mastery * 100.0,
            area.level,
            area.interactions
        )?;
    }
    Ok(())
}

fn write_summary(out: &mut impl Write, tracker: &ProgressTracker) -> CommandResult {
    let summary = tracker.progress_summary();
    write_stats(out, &summary.stats)?;

    writeln!(out, "\nSubjects:")?;
    for subject in &summary.subjects {
        writeln!(
            out,
            "  {}: {:.1}% ({}, {} topics)",
            subject.subject,
            subject.mastery * 100.0,
            subject.level,
            subject.topic_count
        )?;
    }

    writeln!(out)?;
    write_areas(out, "Weak areas", &summary.weak_areas)?;
    write_areas(out, "Strong areas", &summary.strong_areas)?;

    if !summary.recent_quizzes.is_empty() {
        writeln!(out, "\nRecent quizzes:")?;
        for quiz in &summary.recent_quizzes {
            writeln!(
                out,
                "  {} {}: {}/{} ({:.1}%)",
                quiz.timestamp.format("%Y-%m-%d %H:%M"),
                quiz.subject,
                quiz.score,
                quiz.total,
                quiz.percentage
            )?;
        }
    }

    if !summary.achievements.is_empty() {
        writeln!(out, "\nAchievements:")?;
        for achievement in &summary.achievements {
            writeln!(out, "  {}: {}", achievement.name, achievement.description)?;
        }
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

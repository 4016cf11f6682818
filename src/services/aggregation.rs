use std::collections::{BTreeSet, HashSet};

use crate::models::domain::{Answer, GroupStats, LectureStats, QuizStats, UserLectureStats};

/// `100 * correct / total` rounded to `places` decimals; 0 when there is nothing to divide.
pub fn accuracy_rate(correct: i64, total: i64, places: i32) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = (correct.clamp(0, total) as f64 / total as f64) * 100.0;
    let factor = 10f64.powi(places);
    (rate * factor).round() / factor
}

fn average_time(answers: &[&Answer]) -> Option<f64> {
    let times: Vec<i64> = answers.iter().filter_map(|a| a.answer_time_ms).collect();
    if times.is_empty() {
        return None;
    }
    Some(times.iter().sum::<i64>() as f64 / times.len() as f64)
}

fn count_correct(answers: &[&Answer]) -> i64 {
    answers.iter().filter(|a| a.is_correct).count() as i64
}

fn distinct<T, F>(answers: &[&Answer], key: F) -> i64
where
    T: std::hash::Hash + Eq,
    F: Fn(&Answer) -> T,
{
    answers.iter().map(|a| key(*a)).collect::<HashSet<_>>().len() as i64
}

pub fn quiz_stats(quiz_id: i64, answers: &[Answer]) -> QuizStats {
    let scoped: Vec<&Answer> = answers.iter().filter(|a| a.quiz_id == quiz_id).collect();
    let total = scoped.len() as i64;
    let correct = count_correct(&scoped);

    QuizStats {
        quiz_id,
        total_answers: total,
        correct_answers: correct,
        accuracy_rate: accuracy_rate(correct, total, 2),
        avg_answer_time_ms: average_time(&scoped),
    }
}

pub fn user_lecture_stats(lecture_id: i64, user_id: i64, answers: &[Answer]) -> UserLectureStats {
    let scoped: Vec<&Answer> = answers
        .iter()
        .filter(|a| a.lecture_id == lecture_id && a.user_id == user_id)
        .collect();
    let total = scoped.len() as i64;
    let correct = count_correct(&scoped);

    UserLectureStats {
        user_id,
        lecture_id,
        total_questions: total,
        correct_answers: correct,
        accuracy_rate: accuracy_rate(correct, total, 1),
        groups_participated: distinct(&scoped, |a| a.group_id.clone()),
        avg_answer_time_ms: average_time(&scoped),
    }
}

/// Stats for every user who answered at least once in the lecture.
pub fn lecture_user_stats(lecture_id: i64, answers: &[Answer]) -> Vec<UserLectureStats> {
    let users: BTreeSet<i64> = answers
        .iter()
        .filter(|a| a.lecture_id == lecture_id)
        .map(|a| a.user_id)
        .collect();

    users
        .into_iter()
        .map(|user_id| user_lecture_stats(lecture_id, user_id, answers))
        .collect()
}

pub fn group_stats(lecture_id: i64, group_id: &str, answers: &[Answer]) -> GroupStats {
    let scoped: Vec<&Answer> = answers
        .iter()
        .filter(|a| a.lecture_id == lecture_id && a.group_id == group_id)
        .collect();
    let total = scoped.len() as i64;
    let correct = count_correct(&scoped);

    GroupStats {
        group_id: group_id.to_string(),
        lecture_id,
        questions_count: distinct(&scoped, |a| a.quiz_id),
        participants_count: distinct(&scoped, |a| a.user_id),
        total_answers: total,
        correct_answers: correct,
        accuracy_rate: accuracy_rate(correct, total, 2),
        avg_answer_time_ms: average_time(&scoped),
    }
}

pub fn lecture_stats(lecture_id: i64, answers: &[Answer]) -> LectureStats {
    let scoped: Vec<&Answer> = answers.iter().filter(|a| a.lecture_id == lecture_id).collect();
    let total = scoped.len() as i64;
    let correct = count_correct(&scoped);

    LectureStats {
        lecture_id,
        participants_count: distinct(&scoped, |a| a.user_id),
        questions_count: distinct(&scoped, |a| a.quiz_id),
        groups_count: distinct(&scoped, |a| a.group_id.clone()),
        total_answers: total,
        correct_answers: correct,
        overall_accuracy_rate: accuracy_rate(correct, total, 2),
        avg_answer_time_ms: average_time(&scoped),
    }
}

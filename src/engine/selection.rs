use crate::error::{Error, Result};
use crate::models::exam::ExamType;
use crate::models::question::Question;
use crate::models::topic;
use rand::seq::SliceRandom;
use rand::Rng;

/// Fixed per-exam-type shape: how many questions and how much time.
#[derive(Debug, Clone, Copy)]
pub struct ExamConfig {
    pub question_count: usize,
    pub duration_seconds: i64,
}

pub fn config_for(exam_type: ExamType) -> ExamConfig {
    match exam_type {
        ExamType::Practice => ExamConfig {
            question_count: 8,
            duration_seconds: 1800,
        },
        ExamType::Full => ExamConfig {
            question_count: 100,
            duration_seconds: 3600,
        },
        ExamType::Topic => ExamConfig {
            question_count: 10,
            duration_seconds: 600,
        },
    }
}

/// Picks the question set for a new session. The returned order is the order
/// the session keeps for its whole lifetime.
///
/// Fewer matching questions than configured is a documented shortfall, not an
/// error; an empty candidate set is.
pub fn select_questions(
    bank: Vec<Question>,
    exam_type: ExamType,
    topic_id: Option<i32>,
    rng: &mut impl Rng,
) -> Result<Vec<Question>> {
    match exam_type {
        ExamType::Topic => {
            let topic_id = topic_id.ok_or_else(|| {
                Error::Validation("topic_id: required for topic exams".to_string())
            })?;
            if topic::get(topic_id).is_none() {
                return Err(Error::NotFound(format!("Topic {} not found", topic_id)));
            }
            let pool: Vec<Question> = bank.into_iter().filter(|q| q.topic_id == topic_id).collect();
            sample(pool, config_for(exam_type).question_count, rng)
        }
        ExamType::Practice => {
            if topic_id.is_some() {
                return Err(Error::Validation(
                    "topic_id: only valid for topic exams".to_string(),
                ));
            }
            sample(bank, config_for(exam_type).question_count, rng)
        }
        ExamType::Full => {
            if topic_id.is_some() {
                return Err(Error::Validation(
                    "topic_id: only valid for topic exams".to_string(),
                ));
            }
            select_weighted(bank, config_for(exam_type).question_count, rng)
        }
    }
}

fn sample(mut pool: Vec<Question>, count: usize, rng: &mut impl Rng) -> Result<Vec<Question>> {
    if pool.is_empty() {
        return Err(Error::NotFound(
            "No questions found for the specified criteria".to_string(),
        ));
    }
    pool.shuffle(rng);
    pool.truncate(count);
    Ok(pool)
}

/// Full-exam composition: apportion the configured count across topics in
/// proportion to their exam weights, then fill each topic's share from its
/// pool. When a topic cannot cover its share the deficit is backfilled from
/// whatever other topics still have left over.
fn select_weighted(bank: Vec<Question>, count: usize, rng: &mut impl Rng) -> Result<Vec<Question>> {
    if bank.is_empty() {
        return Err(Error::NotFound(
            "No questions found for the specified criteria".to_string(),
        ));
    }

    let total = count.min(bank.len());
    let weights: Vec<(i32, u32)> = topic::catalog().iter().map(|t| (t.id, t.weight)).collect();
    let quotas = apportion(total, &weights);

    let mut pools: std::collections::HashMap<i32, Vec<Question>> =
        std::collections::HashMap::new();
    for q in bank {
        pools.entry(q.topic_id).or_default().push(q);
    }
    for pool in pools.values_mut() {
        pool.shuffle(rng);
    }

    let mut selected: Vec<Question> = Vec::with_capacity(total);
    for (topic_id, quota) in &quotas {
        if let Some(pool) = pools.get_mut(topic_id) {
            let take = (*quota).min(pool.len());
            selected.extend(pool.drain(..take));
        }
    }

    // Backfill shortfalls from remaining questions, topic-agnostic.
    if selected.len() < total {
        let mut leftovers: Vec<Question> = pools.into_values().flatten().collect();
        leftovers.shuffle(rng);
        let missing = total - selected.len();
        selected.extend(leftovers.into_iter().take(missing));
    }

    selected.shuffle(rng);
    Ok(selected)
}

/// Largest-remainder apportionment of `total` seats over percentage weights.
/// Each share lands within one unit of `total * weight / 100` and the shares
/// always sum to exactly `total`. Ties go to the lower topic id.
pub fn apportion(total: usize, weights: &[(i32, u32)]) -> Vec<(i32, usize)> {
    let weight_sum: u32 = weights.iter().map(|(_, w)| w).sum();
    if weight_sum == 0 || total == 0 {
        return weights.iter().map(|(id, _)| (*id, 0)).collect();
    }

    let mut shares: Vec<(i32, usize, f64)> = weights
        .iter()
        .map(|(id, w)| {
            let exact = total as f64 * *w as f64 / weight_sum as f64;
            let base = exact.floor() as usize;
            (*id, base, exact - exact.floor())
        })
        .collect();

    let assigned: usize = shares.iter().map(|(_, base, _)| base).sum();
    let mut leftover = total - assigned;

    shares.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.0.cmp(&b.0)));
    for share in shares.iter_mut() {
        if leftover == 0 {
            break;
        }
        share.1 += 1;
        leftover -= 1;
    }

    shares.sort_by_key(|(id, _, _)| *id);
    shares.into_iter().map(|(id, n, _)| (id, n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::locale::LocalizedText;
    use crate::models::question::{Difficulty, QuestionKind};
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn question(topic_id: i32) -> Question {
        Question {
            id: Uuid::new_v4(),
            topic_id,
            prompt: LocalizedText::new("¿?", "?"),
            kind: QuestionKind::TrueFalse { answer: true },
            explanation: LocalizedText::new("porque sí", "because"),
            difficulty: Difficulty::Medium,
            created_at: Utc::now(),
        }
    }

    fn bank_with(per_topic: usize) -> Vec<Question> {
        let mut bank = Vec::new();
        for t in crate::models::topic::catalog() {
            for _ in 0..per_topic {
                bank.push(question(t.id));
            }
        }
        bank
    }

    #[test]
    fn apportionment_sums_exactly_and_stays_within_one() {
        let weights: Vec<(i32, u32)> = crate::models::topic::catalog()
            .iter()
            .map(|t| (t.id, t.weight))
            .collect();
        for total in [1usize, 7, 10, 33, 100] {
            let shares = apportion(total, &weights);
            let sum: usize = shares.iter().map(|(_, n)| n).sum();
            assert_eq!(sum, total, "total {}", total);
            for ((id, n), (_, w)) in shares.iter().zip(weights.iter()) {
                let exact = total as f64 * *w as f64 / 100.0;
                assert!(
                    (*n as f64 - exact).abs() <= 1.0,
                    "topic {} got {} for exact {}",
                    id,
                    n,
                    exact
                );
            }
        }
    }

    #[test]
    fn full_exam_is_topic_proportional() {
        let mut rng = StdRng::seed_from_u64(7);
        let selected =
            select_questions(bank_with(30), ExamType::Full, None, &mut rng).unwrap();
        assert_eq!(selected.len(), 100);

        for t in crate::models::topic::catalog() {
            let got = selected.iter().filter(|q| q.topic_id == t.id).count();
            let exact = 100.0 * t.weight as f64 / 100.0;
            assert!(
                (got as f64 - exact).abs() <= 1.0,
                "topic {}: {} questions for weight {}",
                t.id,
                got,
                t.weight
            );
        }
    }

    #[test]
    fn full_exam_backfills_starved_topics() {
        // Topic 9 (weight 15) has only 2 questions; the rest are plentiful.
        let mut bank = Vec::new();
        for t in crate::models::topic::catalog() {
            let n = if t.id == 9 { 2 } else { 30 };
            for _ in 0..n {
                bank.push(question(t.id));
            }
        }
        let mut rng = StdRng::seed_from_u64(11);
        let selected = select_questions(bank, ExamType::Full, None, &mut rng).unwrap();
        assert_eq!(selected.len(), 100);
        assert_eq!(selected.iter().filter(|q| q.topic_id == 9).count(), 2);
    }

    #[test]
    fn shortfall_returns_all_available() {
        let mut rng = StdRng::seed_from_u64(3);
        let bank: Vec<Question> = (0..4).map(|_| question(5)).collect();
        let selected =
            select_questions(bank, ExamType::Topic, Some(5), &mut rng).unwrap();
        assert_eq!(selected.len(), 4);
    }

    #[test]
    fn topic_exam_filters_and_caps() {
        let mut rng = StdRng::seed_from_u64(5);
        let selected =
            select_questions(bank_with(20), ExamType::Topic, Some(3), &mut rng).unwrap();
        assert_eq!(selected.len(), 10);
        assert!(selected.iter().all(|q| q.topic_id == 3));
    }

    #[test]
    fn topic_exam_requires_known_topic() {
        let mut rng = StdRng::seed_from_u64(5);
        let err = select_questions(bank_with(2), ExamType::Topic, None, &mut rng).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err =
            select_questions(bank_with(2), ExamType::Topic, Some(99), &mut rng).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn practice_rejects_topic_filter() {
        let mut rng = StdRng::seed_from_u64(5);
        let err =
            select_questions(bank_with(2), ExamType::Practice, Some(1), &mut rng).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn empty_bank_is_not_found() {
        let mut rng = StdRng::seed_from_u64(5);
        let err = select_questions(Vec::new(), ExamType::Practice, None, &mut rng).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}

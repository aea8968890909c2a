use crate::model::{AnswerResponse, CitationRule, Expectations, Score};

pub fn score(response: &AnswerResponse, expects: Option<&Expectations>) -> Score {
    let answer = response.final_answer.to_lowercase();
    let pool = evidence_pool(response);

    let (exact, cits_ok) = match expects {
        Some(expects) => (
            exact_ratio(&answer, &expects.answer_contains),
            citations_satisfied(response, &pool, &expects.citations),
        ),
        None => (1.0, true),
    };

    Score {
        exact,
        cits_ok,
        grounded: u8::from(!response.citations.is_empty()),
    }
}

fn evidence_pool(response: &AnswerResponse) -> Vec<String> {
    let mut pool = Vec::with_capacity(1 + response.evidence.hits.len() + response.citations.len());
    pool.push(response.final_answer.to_lowercase());
    pool.extend(response.evidence.hits.iter().map(|hit| hit.text.to_lowercase()));
    pool.extend(
        response
            .citations
            .iter()
            .filter(|citation| !citation.path.is_empty())
            .map(|citation| citation.path.to_lowercase()),
    );
    pool
}

fn exact_ratio(answer: &str, required: &[String]) -> f64 {
    if required.is_empty() {
        return 1.0;
    }

    let matched = required
        .iter()
        .filter(|needle| answer.contains(&needle.to_lowercase()))
        .count();
    matched as f64 / required.len() as f64
}

// Stops at the first rule that fails.
fn citations_satisfied(response: &AnswerResponse, pool: &[String], rules: &[CitationRule]) -> bool {
    rules.iter().all(|rule| {
        let wanted = rule.wanted();
        let type_ok = response
            .citations
            .iter()
            .any(|citation| wanted.accepts(citation.kind));

        type_ok
            && rule.must_include.iter().all(|needle| {
                let needle = needle.to_lowercase();
                pool.iter().any(|text| text.contains(&needle))
            })
    })
}

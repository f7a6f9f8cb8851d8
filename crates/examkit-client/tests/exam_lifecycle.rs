//! Composition and grading against real backend implementations.

use examkit_client::{HttpBackend, InMemoryBackend};
use examkit_core::bank::BankQuestion;
use examkit_core::model::{Question, QuestionKind, TruthValue};
use examkit_core::traits::ExamBackend;
use examkit_core::{ExamComposer, ExamError, GradingSession, Phase, QuestionField, SaveOutcome};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn compose_quiz() -> ExamComposer {
    let mut composer = ExamComposer::new("Geography", "Name: ____  Date: ____");

    let mc = composer.add_question(QuestionKind::MultipleChoice);
    composer
        .update_field(mc, QuestionField::Prompt, "Capital of France?")
        .unwrap();
    for (i, choice) in ["Berlin", "Paris", "Rome", "Madrid"].iter().enumerate() {
        composer
            .update_field(mc, QuestionField::Choice(i), *choice)
            .unwrap();
    }
    composer
        .update_field(mc, QuestionField::CorrectAnswer, "b")
        .unwrap();

    let tf = composer.add_question(QuestionKind::TrueFalse);
    composer
        .update_field(tf, QuestionField::Prompt, "The Nile is in Africa")
        .unwrap();
    composer
        .update_field(tf, QuestionField::CorrectAnswer, "true")
        .unwrap();

    let essay = composer.add_question(QuestionKind::Essay);
    composer
        .update_field(essay, QuestionField::Prompt, "Describe a river delta")
        .unwrap();
    composer
}

#[tokio::test]
async fn saved_exam_reloads_identically() {
    let backend = InMemoryBackend::new("prof@example.com");
    let mut composer = compose_quiz();

    let outcome = composer.save(&backend).await.unwrap();
    let SaveOutcome::Created(id) = outcome else {
        panic!("first save should create the exam");
    };
    assert_eq!(composer.exam_id(), Some(id.as_str()));

    let reopened = ExamComposer::open(&backend, &id).await.unwrap();
    assert_eq!(reopened.to_exam(), composer.to_exam());
    assert_eq!(reopened.question(1).unwrap().correct_answer, "verdadeiro");
}

#[tokio::test]
async fn second_save_updates_in_place() {
    let backend = InMemoryBackend::new("t");
    let mut composer = compose_quiz();

    composer.save(&backend).await.unwrap();
    composer.set_title("Geography II");
    assert_eq!(composer.save(&backend).await.unwrap(), SaveOutcome::Updated);
    assert_eq!(backend.exam_count(), 1);

    let id = composer.exam_id().unwrap().to_string();
    assert_eq!(backend.fetch_exam(&id).await.unwrap().title, "Geography II");
}

#[tokio::test]
async fn invalid_exam_is_not_sent() {
    let backend = InMemoryBackend::new("t");
    let mut composer = compose_quiz();
    composer.add_question(QuestionKind::MultipleChoice);

    let err = composer.save(&backend).await.unwrap_err();
    assert!(matches!(err, ExamError::InvalidQuestion { position: 3, .. }));
    assert_eq!(backend.exam_count(), 0);
    assert!(composer.exam_id().is_none());
}

#[tokio::test]
async fn bank_questions_round_trip_into_a_new_exam() {
    let backend = InMemoryBackend::new("prof@example.com");
    let composer = compose_quiz();
    composer.save_to_bank(0, &backend).await.unwrap();
    composer.save_to_bank(1, &backend).await.unwrap();

    let bank = backend
        .list_bank_questions("prof@example.com")
        .await
        .unwrap();
    assert_eq!(bank.len(), 2);

    let mut other = ExamComposer::new("Review", "");
    let range = other.import_selected(&bank[1..]);
    assert_eq!(range, 0..1);
    assert_eq!(other.question(0).unwrap().prompt, "The Nile is in Africa");

    other
        .update_field(0, QuestionField::Prompt, "Edited")
        .unwrap();
    let bank_again = backend
        .list_bank_questions("prof@example.com")
        .await
        .unwrap();
    assert_eq!(bank_again[1].question.prompt, "The Nile is in Africa");
}

#[tokio::test]
async fn full_grading_session_against_memory_backend() {
    let backend = InMemoryBackend::new("t");
    let mut composer = compose_quiz();
    let SaveOutcome::Created(id) = composer.save(&backend).await.unwrap() else {
        panic!("expected create");
    };

    let mut session = GradingSession::open(&backend, &id).await.unwrap();
    session.start("  Ana  ").unwrap();
    assert_eq!(session.student_name(), "Ana");

    session.answer("B").unwrap();
    session.answer("verdadeiro").unwrap();
    let phase = session.skip().unwrap();
    assert_eq!(
        *phase,
        Phase::Completed {
            no_questions: false
        }
    );

    let summary = session.submit(&backend).await.unwrap();
    assert_eq!(summary.student_name, "Ana");
    assert_eq!(summary.correct_count, 2);
    assert_eq!(summary.total_objective, 2);
    assert_eq!(backend.graded().len(), 1);

    session.grade_another().unwrap();
    assert_eq!(*session.phase(), Phase::CollectingName);
    assert!(session.answers().is_empty());
}

#[tokio::test]
async fn grading_over_http() {
    let server = MockServer::start().await;

    let exam = serde_json::json!({
        "id": "p9",
        "titulo": "Quiz",
        "cabecalho": "",
        "questoes": [
            {"tipo": "verdadeiro_falso", "enunciado": "Water is wet", "alternativas": [], "resposta": "verdadeiro"},
            {"tipo": "dissertativa", "enunciado": "Why?", "alternativas": [], "resposta": ""}
        ]
    });

    Mock::given(method("GET"))
        .and(path("/api/provas/p9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&exam))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/provas/p9/corrigir"))
        .and(body_json(serde_json::json!({
            "nome_aluno": "Bruno",
            "respostas": ["falso", "no idea"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nome_aluno": "Bruno",
            "acertos": 0,
            "total_questoes": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri(), None, 5).unwrap();
    let mut session = GradingSession::open(&backend, "p9").await.unwrap();
    session.start("Bruno").unwrap();
    session.answer("falso").unwrap();
    session.answer("no idea").unwrap();

    let summary = session.submit(&backend).await.unwrap();
    assert_eq!(summary.correct_count, 0);
    assert_eq!(summary.fraction(), Some(0.0));
}

#[tokio::test]
async fn failed_submission_can_be_retried() {
    let server = MockServer::start().await;

    let exam = serde_json::json!({
        "titulo": "Quiz",
        "cabecalho": "",
        "questoes": [
            {"tipo": "verdadeiro_falso", "enunciado": "Water is wet", "alternativas": [], "resposta": "verdadeiro"}
        ]
    });

    Mock::given(method("GET"))
        .and(path("/api/provas/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&exam))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/provas/p1/corrigir"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri(), None, 5).unwrap();
    let mut session = GradingSession::open(&backend, "p1").await.unwrap();
    session.start("Ana").unwrap();
    session.answer("verdadeiro").unwrap();

    let err = session.submit(&backend).await.unwrap_err();
    assert!(matches!(err, ExamError::ScoringUnavailable(_)));
    assert_eq!(
        *session.phase(),
        Phase::Completed {
            no_questions: false
        }
    );

    // Same session, healthy backend.
    let local = InMemoryBackend::new("t");
    local.insert_exam("p1", session.exam().as_ref().clone());
    let summary = session.submit(&local).await.unwrap();
    assert_eq!(summary.correct_count, 1);
}

#[tokio::test]
async fn bank_entries_from_server_import_cleanly() {
    let entry = BankQuestion {
        bank_id: "q7".into(),
        owner_id: "t@example.com".into(),
        question: Question::true_false("Ice floats", TruthValue::True),
    };
    let backend = InMemoryBackend::new("t@example.com");
    backend.insert_bank_question(entry.clone());

    let listed = backend.list_bank_questions("t@example.com").await.unwrap();
    assert_eq!(listed, vec![entry]);

    let mut composer = ExamComposer::new("From bank", "");
    composer.import_selected(&listed);
    composer.validate().unwrap();
}

#[tokio::test]
async fn english_truth_keys_grade_against_offered_options() {
    let exam: examkit_core::model::Exam = serde_json::from_value(serde_json::json!({
        "titulo": "Quiz",
        "questoes": [
            {"tipo": "verdadeiro_falso", "enunciado": "Sky is blue", "resposta": "True"},
            {"tipo": "verdadeiro_falso", "enunciado": "Fire is cold", "resposta": "false"}
        ]
    }))
    .unwrap();
    let backend = InMemoryBackend::new("t");
    backend.insert_exam("e1", exam);

    let mut session = GradingSession::open(&backend, "e1").await.unwrap();
    session.start("Ana").unwrap();
    let first = session.current().unwrap().options[0].value.clone();
    session.answer(first).unwrap();
    let second = session.current().unwrap().options[1].value.clone();
    session.answer(second).unwrap();

    let summary = session.submit(&backend).await.unwrap();
    assert_eq!(summary.correct_count, 2);
    assert_eq!(summary.total_objective, 2);
}

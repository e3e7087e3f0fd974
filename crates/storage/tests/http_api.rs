use std::sync::{Arc, Mutex};

use quiz_core::model::{Difficulty, QuestionKind, QuizResult};
use quiz_core::time::fixed_now;
use storage::http::{HttpQuizApi, QuizApiConfig};
use storage::{ApiError, GenerationRequest, QuestionGenerator, ResultRecorder, UserContext};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves a single canned response and keeps the raw request for inspection.
struct OneShotServer {
    url: String,
    captured: Arc<Mutex<Option<String>>>,
}

impl OneShotServer {
    async fn start(status: &'static str, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let captured = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&captured);

        tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let request = read_request(&mut stream).await;
            *sink.lock().unwrap() = Some(request);
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        });

        Self { url, captured }
    }

    fn request(&self) -> String {
        self.captured.lock().unwrap().clone().unwrap_or_default()
    }
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn api(url: &str) -> HttpQuizApi {
    HttpQuizApi::new(QuizApiConfig::new(url)).unwrap()
}

fn request(kind: QuestionKind) -> GenerationRequest {
    GenerationRequest {
        topic: "World War II".into(),
        difficulty: Difficulty::Hard,
        kind,
        count: 3,
        language: "en".into(),
    }
}

#[tokio::test]
async fn generate_posts_request_and_parses_questions() {
    let server = OneShotServer::start(
        "200 OK",
        r#"[{"question":"Year it ended?","options":["A) 1944","B) 1945","C) 1946"],"answer":"B"}]"#,
    )
    .await;
    let user = UserContext::anonymous().with_user_id("student-1");

    let questions = api(&server.url)
        .generate(&user, &request(QuestionKind::MultipleChoice))
        .await
        .unwrap();

    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].correct_answer(), "B");
    assert_eq!(questions[0].options().len(), 3);

    let raw = server.request();
    assert!(raw.starts_with("POST /generate-qa"));
    assert!(raw.to_ascii_lowercase().contains("x-user-id: student-1"));
    assert!(raw.contains(r#""kind":"mcq""#));
    assert!(raw.contains(r#""count":3"#));
}

#[tokio::test]
async fn unauthorized_status_is_reported() {
    let server = OneShotServer::start("401 Unauthorized", "{}").await;
    let err = api(&server.url)
        .generate(&UserContext::anonymous(), &request(QuestionKind::Short))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(status) if status.as_u16() == 401));
}

#[tokio::test]
async fn server_error_is_reported_as_status() {
    let server = OneShotServer::start("500 Internal Server Error", "{}").await;
    let err = api(&server.url)
        .generate(&UserContext::anonymous(), &request(QuestionKind::Short))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::HttpStatus(status) if status.as_u16() == 500));
}

#[tokio::test]
async fn malformed_body_is_a_serialization_error() {
    let server = OneShotServer::start("200 OK", r#"{"unexpected":true}"#).await;
    let err = api(&server.url)
        .generate(&UserContext::anonymous(), &request(QuestionKind::TrueFalse))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Serialization(_)));
}

#[tokio::test]
async fn record_result_sends_bearer_token_and_camel_case_body() {
    let server = OneShotServer::start("201 Created", "{}").await;
    let user = UserContext::anonymous().with_access_token("head.payload.sig");
    let result = QuizResult {
        topic: "World War II".into(),
        score: 2,
        total_questions: 3,
        percentage: 67,
        kind: QuestionKind::MultipleChoice,
        difficulty: Difficulty::Hard,
        completed_at: fixed_now(),
    };

    api(&server.url).record_result(&user, &result).await.unwrap();

    let raw = server.request();
    assert!(raw.starts_with("POST /quiz-results"));
    assert!(raw.to_ascii_lowercase().contains("authorization: bearer head.payload.sig"));
    assert!(raw.contains(r#""totalQuestions":3"#));
    assert!(raw.contains(r#""percentage":67"#));
}

use super::*;
use rstest::rstest;

#[test]
fn test_page_request_default_uses_configured_size() {
    let page = PageRequest::default().resolve(20, 100).unwrap();
    assert_eq!(page.page, 0);
    assert_eq!(page.page_size, 20);
}

#[test]
fn test_page_offset() {
    let page = Page {
        page: 0,
        page_size: 20,
    };
    assert_eq!(page.offset(), 0);

    let page = Page {
        page: 3,
        page_size: 20,
    };
    assert_eq!(page.offset(), 60);
    assert_eq!(page.limit(), 20);
}

#[test]
fn test_zero_page_size_is_rejected() {
    let request = PageRequest {
        page: 0,
        page_size: Some(0),
    };
    assert!(matches!(
        request.resolve(20, 100),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn test_oversized_page_is_rejected() {
    let request = PageRequest {
        page: 0,
        page_size: Some(101),
    };
    assert!(request.resolve(20, 100).is_err());
}

#[rstest]
#[case(0, 10, 0)]
#[case(1, 10, 1)]
#[case(10, 10, 1)]
#[case(11, 10, 2)]
#[case(20, 10, 2)]
#[case(21, 10, 3)]
#[case(5, 1, 5)]
#[case(7, 3, 3)]
fn test_page_count(#[case] total: u64, #[case] size: u64, #[case] expected: u64) {
    assert_eq!(page_count(total, size), expected);
}

#[test]
fn test_page_response_new() {
    let data = vec![1, 2, 3];
    let page = Page {
        page: 1,
        page_size: 3,
    };
    let response = PageResponse::new(data.clone(), page, 7);

    assert_eq!(response.data, data);
    assert_eq!(
        response.meta,
        PageMeta {
            page: 1,
            page_size: 3,
            total: 7,
            total_pages: 3,
        }
    );
}

#[test]
fn test_page_response_serialization() {
    let response = PageResponse::new(
        vec!["a"],
        Page {
            page: 0,
            page_size: 10,
        },
        1,
    );
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["meta"]["total_pages"], 1);
    assert_eq!(json["data"][0], "a");
}

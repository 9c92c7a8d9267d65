use repodash::{AddForm, ValidationError};

#[test]
fn urls_without_git_suffix_are_rejected() {
    for url in [
        "https://github.com/tkellogg/dura",
        "https://github.com/tkellogg/dura.git/",
        "git@github.com:tkellogg/dura.gitx",
        "dura.GIT",
    ] {
        let mut form = AddForm::new().name("dura").url(url);
        assert_eq!(form.submit(), Err(ValidationError::InvalidUrl), "{url}");
    }
}

#[test]
fn blank_name_or_url_is_rejected() {
    for (name, url) in [("", "a.git"), ("   ", "a.git"), ("a", ""), ("a", " \t "), ("", "")] {
        let mut form = AddForm::new().name(name).url(url);
        assert_eq!(form.submit(), Err(ValidationError::MissingFields));
    }
}

#[test]
fn failed_submit_keeps_raw_input() {
    let mut form = AddForm::new()
        .name(" dura ")
        .url("https://github.com/tkellogg/dura")
        .nickname("backup")
        .master(true);
    let before = form.clone();

    assert!(form.submit().is_err());
    assert_eq!(form, before);
}

#[test]
fn successful_submit_trims_and_clears() {
    let mut form = AddForm::new()
        .name("  dura ")
        .url(" https://github.com/tkellogg/dura.git  ")
        .nickname(" backup ")
        .master(true);

    let repo = form.submit().unwrap();
    assert_eq!(repo.name, "dura");
    assert_eq!(repo.url, "https://github.com/tkellogg/dura.git");
    assert_eq!(repo.nickname.as_deref(), Some("backup"));
    assert!(repo.is_master);

    assert_eq!(form, AddForm::default());
}

#[test]
fn blank_nickname_becomes_none() {
    let mut form = AddForm::new().name("dura").url("dura.git").nickname("   ");
    assert_eq!(form.submit().unwrap().nickname, None);
}

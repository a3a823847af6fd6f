//! Tests for Plex session, playlist and metadata parsing

#[cfg(test)]
mod tests {
    use crate::error::MonitorError;
    use crate::models::format_last_viewed;
    use crate::xml_parser::*;

    #[test]
    fn test_single_session() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<MediaContainer size="1">
  <Video title="Movie X" year="2020" type="movie" duration="600000" viewOffset="300000">
    <User id="1" title="alice"/>
    <Player platform="Chrome" state="playing"/>
  </Video>
</MediaContainer>"#;

        let sessions = parse_sessions(xml).unwrap();
        assert_eq!(sessions.len(), 1);

        let session = &sessions[0];
        assert_eq!(session.username, "alice");
        assert_eq!(session.title.as_deref(), Some("Movie X"));
        assert_eq!(session.year.as_deref(), Some("2020"));
        assert_eq!(session.media_type.as_deref(), Some("movie"));
        assert_eq!(session.duration, Some(600_000));
        assert_eq!(session.view_offset, Some(300_000));
        assert_eq!(session.player, "Chrome");
        assert_eq!(session.state, "playing");
        assert_eq!(session.progress, "50.0%");
    }

    #[test]
    fn test_sessions_keep_document_order() {
        let xml = r#"<MediaContainer>
  <Video title="First" duration="1000" viewOffset="100"><User title="a"/></Video>
  <Video title="Second" duration="1000" viewOffset="200"><User title="b"/></Video>
  <Video title="Third" duration="1000" viewOffset="300"><User title="c"/></Video>
</MediaContainer>"#;

        let sessions = parse_sessions(xml).unwrap();
        let titles: Vec<_> = sessions.iter().filter_map(|s| s.title.as_deref()).collect();
        assert_eq!(titles, ["First", "Second", "Third"]);
        assert_eq!(sessions[2].username, "c");
        assert_eq!(sessions[2].progress, "30.0%");
    }

    #[test]
    fn test_sessions_nested_deep() {
        let xml = r#"<MediaContainer><Hub><Group>
  <Video title="Deep" duration="4000" viewOffset="1000"/>
</Group></Hub></MediaContainer>"#;

        let sessions = parse_sessions(xml).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].progress, "25.0%");
    }

    #[test]
    fn test_nested_sessions_each_produce_a_record() {
        let xml = r#"<MediaContainer>
  <Video title="Outer" duration="1000" viewOffset="500">
    <User title="outer-user"/>
    <Video title="Inner"><User title="inner-user"/><Player platform="Roku"/></Video>
    <Player platform="Chrome"/>
  </Video>
  <Video title="Third"/>
</MediaContainer>"#;

        let sessions = parse_sessions(xml).unwrap();
        let titles: Vec<_> = sessions.iter().filter_map(|s| s.title.as_deref()).collect();
        assert_eq!(titles, ["Outer", "Inner", "Third"]);

        assert_eq!(sessions[0].username, "outer-user");
        assert_eq!(sessions[0].player, "Chrome");
        assert_eq!(sessions[0].progress, "50.0%");
        assert_eq!(sessions[1].username, "inner-user");
        assert_eq!(sessions[1].player, "Roku");
        assert_eq!(sessions[2].username, "Unknown User");
    }

    #[test]
    fn test_root_element_is_not_matched() {
        assert!(parse_sessions(r#"<Video title="Root"/>"#).unwrap().is_empty());
        assert!(parse_playlists(r#"<Playlist title="Root"/>"#).unwrap().is_empty());
        assert!(parse_metadata(r#"<Video title="Root"/>"#).unwrap().is_none());
    }

    #[test]
    fn test_session_sentinels() {
        let xml = r#"<MediaContainer><Video title="Lonely"/></MediaContainer>"#;

        let sessions = parse_sessions(xml).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].username, "Unknown User");
        assert_eq!(sessions[0].player, "Unknown Platform");
        assert_eq!(sessions[0].state, "Unknown State");
    }

    #[test]
    fn test_session_without_duration_does_not_divide_by_zero() {
        let xml = r#"<MediaContainer>
  <Video title="Live" viewOffset="0"/>
  <Video title="Zero" duration="0"/>
</MediaContainer>"#;

        let sessions = parse_sessions(xml).unwrap();
        assert_eq!(sessions[0].duration, None);
        assert_eq!(sessions[0].progress, "0.0%");
        assert_eq!(sessions[1].progress, "0.0%");
    }

    #[test]
    fn test_user_only_counts_as_direct_child() {
        let xml = r#"<MediaContainer>
  <Video title="Show">
    <Media><Part><User title="not-me"/></Part></Media>
    <Player platform="Roku"/>
  </Video>
</MediaContainer>"#;

        let sessions = parse_sessions(xml).unwrap();
        assert_eq!(sessions[0].username, "Unknown User");
        assert_eq!(sessions[0].player, "Roku");
        assert_eq!(sessions[0].state, "Unknown State");
    }

    #[test]
    fn test_empty_session_list() {
        let xml = r#"<MediaContainer size="0"></MediaContainer>"#;
        assert!(parse_sessions(xml).unwrap().is_empty());
    }

    #[test]
    fn test_sessions_invalid_number() {
        let xml = r#"<MediaContainer><Video title="Bad" duration="long"/></MediaContainer>"#;
        match parse_sessions(xml) {
            Err(MonitorError::InvalidAttribute { element, attribute, value }) => {
                assert_eq!(element, "Video");
                assert_eq!(attribute, "duration");
                assert_eq!(value, "long");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        let broken = [
            "",
            "not xml at all",
            "<MediaContainer><Video title=\"x\">",
            "<MediaContainer><Video></MediaContainer>",
            "<MediaContainer></Video>",
            "<a/><MediaContainer><Video/></MediaContainer>",
            "junk<MediaContainer><Video/></MediaContainer>",
            "<MediaContainer><Video/></MediaContainer>trailing",
        ];

        for xml in broken {
            assert!(
                matches!(parse_sessions(xml), Err(MonitorError::Xml(_))),
                "sessions accepted: {:?}",
                xml
            );
            assert!(parse_playlists(xml).is_err(), "playlists accepted: {:?}", xml);
            assert!(parse_metadata(xml).is_err(), "metadata accepted: {:?}", xml);
        }
    }

    #[test]
    fn test_whitespace_and_prolog_around_root() {
        let xml = "<?xml version=\"1.0\"?>\n<!-- sessions -->\n<MediaContainer><Video title=\"x\"/></MediaContainer>\n\n";
        assert_eq!(parse_sessions(xml).unwrap().len(), 1);
    }

    #[test]
    fn test_entities_in_attributes() {
        let xml = r#"<MediaContainer>
  <Video title="Tom &amp; Jerry &quot;Live&quot;"><User title="O&apos;Brien"/></Video>
</MediaContainer>"#;

        let sessions = parse_sessions(xml).unwrap();
        assert_eq!(sessions[0].title.as_deref(), Some("Tom & Jerry \"Live\""));
        assert_eq!(sessions[0].username, "O'Brien");
    }

    #[test]
    fn test_playlists() {
        let xml = r#"<MediaContainer size="2">
  <Playlist ratingKey="1" title="Favourites" summary="Best of" duration="125000" leafCount="12" lastViewedAt="1700000000"/>
  <Playlist ratingKey="2" title="Queue"/>
</MediaContainer>"#;

        let playlists = parse_playlists(xml).unwrap();
        assert_eq!(playlists.len(), 2);

        assert_eq!(playlists[0].title.as_deref(), Some("Favourites"));
        assert_eq!(playlists[0].summary, "Best of");
        assert_eq!(playlists[0].duration_secs, 125);
        assert_eq!(playlists[0].item_count, "12");
        assert_eq!(playlists[0].last_viewed_at, format_last_viewed(Some(1_700_000_000)));

        assert_eq!(playlists[1].summary, "No description");
        assert_eq!(playlists[1].duration_secs, 0);
        assert_eq!(playlists[1].item_count, "0");
        assert_eq!(playlists[1].last_viewed_at, "Never");
    }

    #[test]
    fn test_playlist_duration_floors() {
        let xml = r#"<MediaContainer><Playlist title="p" duration="125999"/></MediaContainer>"#;
        assert_eq!(parse_playlists(xml).unwrap()[0].duration_secs, 125);

        let xml = r#"<MediaContainer><Playlist title="p" duration="-1"/></MediaContainer>"#;
        assert_eq!(parse_playlists(xml).unwrap()[0].duration_secs, -1);
    }

    #[test]
    fn test_playlist_never_viewed_epoch_zero() {
        let xml = r#"<MediaContainer><Playlist title="p" lastViewedAt="0"/></MediaContainer>"#;
        assert_eq!(parse_playlists(xml).unwrap()[0].last_viewed_at, "Never");
    }

    #[test]
    fn test_metadata() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<MediaContainer size="1">
  <Video ratingKey="42" title="The Film" year="1999" rating="8.7" summary="A story." duration="5400000">
    <Genre tag="Action"/>
    <Genre tag="Sci-Fi"/>
    <Director tag="Lana"/>
    <Director tag="Lilly"/>
    <Writer tag="Lana"/>
  </Video>
  <Account title="alice"/>
  <Account title="bob"/>
  <Account title="alice"/>
</MediaContainer>"#;

        let metadata = parse_metadata(xml).unwrap().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("The Film"));
        assert_eq!(metadata.year.as_deref(), Some("1999"));
        assert_eq!(metadata.rating.as_deref(), Some("8.7"));
        assert_eq!(metadata.summary.as_deref(), Some("A story."));
        assert_eq!(metadata.duration, "90 minutes");
        assert_eq!(metadata.genres, ["Action", "Sci-Fi"]);
        assert_eq!(metadata.directors, ["Lana", "Lilly"]);
        assert_eq!(metadata.writers, ["Lana"]);
        assert_eq!(metadata.viewed_by, ["alice", "bob", "alice"]);
    }

    #[test]
    fn test_metadata_uses_first_video() {
        let xml = r#"<MediaContainer>
  <Video title="One" duration="60000"/>
  <Video title="Two" duration="120000"/>
</MediaContainer>"#;

        let metadata = parse_metadata(xml).unwrap().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("One"));
        assert_eq!(metadata.duration, "1 minutes");
    }

    #[test]
    fn test_metadata_defaults() {
        let xml = r#"<MediaContainer><Video title="Bare"><Genre/></Video></MediaContainer>"#;

        let metadata = parse_metadata(xml).unwrap().unwrap();
        assert_eq!(metadata.duration, "0 minutes");
        assert!(metadata.year.is_none());
        assert!(metadata.genres.is_empty());
        assert!(metadata.viewed_by.is_empty());
    }

    #[test]
    fn test_metadata_without_video() {
        let xml = r#"<MediaContainer size="0"><Directory title="Shows"/></MediaContainer>"#;
        assert!(parse_metadata(xml).unwrap().is_none());
    }
}

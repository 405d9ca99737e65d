//! Integration tests for types

#[cfg(test)]
mod tests {
    use pk_types::*;
    use proptest::prelude::*;

    fn field() -> impl Strategy<Value = String> {
        "[a-z0-9._+-]{1,12}"
    }

    proptest! {
        #[test]
        fn contains_ignores_source_tag(
            name in field(),
            version in field(),
            arch in field(),
            tag_a in "[a-z0-9]{0,8}",
            tag_b in "[a-z0-9]{0,8}",
        ) {
            let stored = format!("{name};{version};{arch};{tag_a}");
            let lookup = PackageId::new(name, version, arch, tag_b).unwrap();

            let mut plist = PackageList::new();
            plist.add(InfoKind::Available, &stored, None).unwrap();

            prop_assert!(plist.contains(&lookup));
        }
    }

    #[test]
    fn test_add_item_copies_record() {
        let original = PackageRecord::from_parts(
            InfoKind::Installed,
            "glib2;2.14.0;i386;fedora",
            Some("The GLib library"),
        )
        .unwrap();

        let mut plist = PackageList::new();
        assert!(plist.add_item(&original));
        drop(original);

        let stored = plist.get_item(0).unwrap();
        assert_eq!(stored.summary(), Some("The GLib library"));
    }

    #[test]
    fn test_add_item_rejects_same_package_other_tag() {
        let mut plist = PackageList::new();
        let fedora =
            PackageRecord::from_parts(InfoKind::Installed, "gnome;1.23;i386;fedora", None).unwrap();
        let local =
            PackageRecord::from_parts(InfoKind::Installed, "gnome;1.23;i386;local", None).unwrap();

        assert!(plist.add_item(&fedora));
        assert!(!plist.add_item(&local));
        assert_eq!(plist.get_size(), 1);
    }

    #[test]
    fn test_package_list_json() {
        let mut plist = PackageList::new();
        plist
            .add(InfoKind::Installed, "gnome;1.23;i386;data", Some("GNOME!"))
            .unwrap();
        let json = serde_json::to_string(&plist).unwrap();
        assert_eq!(
            json,
            r#"[{"info":"installed","package_id":"gnome;1.23;i386;data","summary":"GNOME!"}]"#
        );
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }
}

use pinwheel::rotation::episode::parse;

pub fn tag(names: &[String]) {
    for name in names {
        let tag = parse(name);
        let kind = if tag.is_special() {
            "special"
        } else if tag.is_numbered() {
            "episode"
        } else {
            "named"
        };
        println!("{tag}\t{kind}\t{name}");
    }
}
